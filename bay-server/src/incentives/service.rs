//! 店铺内的奖金规则存取、匹配与预览

use serde::Serialize;
use shared::models::Certification;
use shared::{AppError, AppResult, ErrorCode};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::calculator::{BonusBreakdown, compute_bonus};
use super::matcher::select_active_rule;
use crate::db::models::{IncentiveRule, IncentiveRuleCreate, IncentiveRuleUpdate};
use crate::db::repository::{IncentiveRuleRepository, parse_record_id};
use crate::identity::Actor;
use crate::utils::validation::{MAX_JOB_MINUTES, validate_payload};

/// Potential bonus for a hypothetical completion
#[derive(Debug, Clone, Serialize)]
pub struct BonusPreview {
    pub rule: Option<IncentiveRule>,
    pub time_saved: i64,
    pub units: i64,
    pub bonus: f64,
    pub multiplier: f64,
}

#[derive(Clone)]
pub struct IncentiveService {
    rules: IncentiveRuleRepository,
}

fn check_effective_window(from: i64, until: Option<i64>) -> AppResult<()> {
    if let Some(until) = until
        && until < from
    {
        return Err(AppError::with_message(
            ErrorCode::InvalidRule,
            "effective_until must not be before effective_from",
        ));
    }
    Ok(())
}

fn check_finite(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::InvalidRule,
            format!("{field} must be a finite number"),
        ));
    }
    Ok(())
}

impl IncentiveService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            rules: IncentiveRuleRepository::new(db),
        }
    }

    /// All rules of the caller's shop, newest first
    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<IncentiveRule>> {
        let shop = actor.managed_shop()?;
        Ok(self.rules.find_by_shop(shop).await?)
    }

    /// Load a rule, hiding rules of other shops
    pub async fn get(&self, actor: &Actor, rule_id: &str) -> AppResult<IncentiveRule> {
        let shop = actor.managed_shop()?;
        let id = parse_record_id("incentive_rule", rule_id)?;
        self.rules
            .find_by_id(&id)
            .await?
            .filter(|rule| &rule.shop == shop)
            .ok_or_else(|| AppError::new(ErrorCode::RuleNotFound).with_detail("rule_id", rule_id))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        payload: IncentiveRuleCreate,
        now: i64,
    ) -> AppResult<IncentiveRule> {
        let shop = actor.managed_shop()?.clone();
        validate_payload(&payload)?;
        check_finite(payload.bonus_per_unit, "bonus_per_unit")?;

        let effective_from = payload.effective_from.unwrap_or(now);
        check_effective_window(effective_from, payload.effective_until)?;

        let rule = IncentiveRule {
            id: None,
            shop,
            name: payload.name.trim().to_string(),
            description: payload.description,
            time_saved_threshold: payload.time_saved_threshold,
            bonus_per_unit: payload.bonus_per_unit,
            is_active: payload.is_active,
            applicable_certs: payload.applicable_certs,
            created_by: actor.id.clone(),
            effective_from,
            effective_until: payload.effective_until,
            created_at: now,
            updated_at: now,
        };

        let created = self.rules.create(rule).await?;
        tracing::info!(
            rule_id = %created.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            threshold = created.time_saved_threshold,
            bonus_per_unit = created.bonus_per_unit,
            "Incentive rule created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        rule_id: &str,
        payload: IncentiveRuleUpdate,
        now: i64,
    ) -> AppResult<IncentiveRule> {
        validate_payload(&payload)?;
        let mut rule = self.get(actor, rule_id).await?;

        if let Some(name) = payload.name {
            rule.name = name.trim().to_string();
        }
        if let Some(description) = payload.description {
            rule.description = description;
        }
        if let Some(threshold) = payload.time_saved_threshold {
            rule.time_saved_threshold = threshold;
        }
        if let Some(bonus) = payload.bonus_per_unit {
            check_finite(bonus, "bonus_per_unit")?;
            rule.bonus_per_unit = bonus;
        }
        if let Some(active) = payload.is_active {
            rule.is_active = active;
        }
        if let Some(certs) = payload.applicable_certs {
            rule.applicable_certs = certs;
        }
        if let Some(from) = payload.effective_from {
            rule.effective_from = from;
        }
        if let Some(until) = payload.effective_until {
            rule.effective_until = until;
        }
        check_effective_window(rule.effective_from, rule.effective_until)?;
        rule.updated_at = now;

        Ok(self.rules.replace(&rule).await?)
    }

    pub async fn delete(&self, actor: &Actor, rule_id: &str) -> AppResult<()> {
        let rule = self.get(actor, rule_id).await?;
        if let Some(id) = rule.id.as_ref() {
            self.rules.delete(id).await?;
        }
        Ok(())
    }

    /// The rule in force for `cert` in a shop, if any
    pub async fn select_active_rule(
        &self,
        shop: &RecordId,
        cert: Certification,
        as_of: i64,
    ) -> AppResult<Option<IncentiveRule>> {
        let rules = self.rules.find_by_shop(shop).await?;
        Ok(select_active_rule(&rules, cert, as_of).cloned())
    }

    /// Bonus for a completion, with the rule that produced it
    pub async fn evaluate(
        &self,
        shop: &RecordId,
        cert: Certification,
        book_time: i64,
        actual_time: i64,
        multiplier: f64,
        as_of: i64,
    ) -> AppResult<(Option<IncentiveRule>, BonusBreakdown)> {
        let rule = self.select_active_rule(shop, cert, as_of).await?;
        let breakdown = match &rule {
            Some(rule) => compute_bonus(
                book_time,
                actual_time,
                rule.time_saved_threshold,
                rule.bonus_per_unit,
                multiplier,
            )
            .map_err(|e| AppError::with_message(ErrorCode::InvalidRule, e.to_string()))?,
            None => BonusBreakdown {
                time_saved: super::calculator::time_saved(book_time, actual_time),
                ..BonusBreakdown::NONE
            },
        };
        Ok((rule, breakdown))
    }

    /// "Potential bonus" preview using the caller's own multiplier
    pub async fn preview(
        &self,
        actor: &Actor,
        cert: Certification,
        book_time: i64,
        actual_time: i64,
        now: i64,
    ) -> AppResult<BonusPreview> {
        if !(1..=MAX_JOB_MINUTES).contains(&book_time)
            || !(0..=MAX_JOB_MINUTES).contains(&actual_time)
        {
            return Err(AppError::validation(format!(
                "book_time must be 1..={MAX_JOB_MINUTES} and actual_time 0..={MAX_JOB_MINUTES} minutes"
            )));
        }
        let shop = actor.shop()?;
        let multiplier = if actor.is_technician() {
            actor.bonus_multiplier
        } else {
            1.0
        };
        let (rule, breakdown) = self
            .evaluate(shop, cert, book_time, actual_time, multiplier, now)
            .await?;
        Ok(BonusPreview {
            rule,
            time_saved: breakdown.time_saved,
            units: breakdown.units,
            bonus: breakdown.bonus,
            multiplier,
        })
    }
}
