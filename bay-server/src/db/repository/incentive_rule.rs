//! Incentive Rule Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::IncentiveRule;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "incentive_rule";

#[derive(Clone)]
pub struct IncentiveRuleRepository {
    base: BaseRepository,
}

impl IncentiveRuleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All rules of a shop, newest first
    pub async fn find_by_shop(&self, shop: &RecordId) -> RepoResult<Vec<IncentiveRule>> {
        let rules: Vec<IncentiveRule> = self
            .base
            .db()
            .query("SELECT * FROM incentive_rule WHERE shop = $shop ORDER BY created_at DESC")
            .bind(("shop", shop.to_string()))
            .await?
            .take(0)?;
        Ok(rules)
    }

    /// Find rule by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<IncentiveRule>> {
        let rule: Option<IncentiveRule> = self.base.db().select(id.clone()).await?;
        Ok(rule)
    }

    /// Create a new rule
    pub async fn create(&self, rule: IncentiveRule) -> RepoResult<IncentiveRule> {
        let mut data = rule;
        data.id = None;
        let created: Option<IncentiveRule> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create incentive rule".to_string()))
    }

    /// Replace a rule with its edited version
    pub async fn replace(&self, rule: &IncentiveRule) -> RepoResult<IncentiveRule> {
        let id = rule
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Rule has no id".to_string()))?;
        let mut data = rule.clone();
        data.id = None;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing CONTENT $data RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("data", data))
            .await?;

        result
            .take::<Option<IncentiveRule>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Incentive rule {} not found", id)))
    }

    /// Hard delete
    pub async fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        let deleted: Option<IncentiveRule> = self.base.db().delete(id.clone()).await?;
        Ok(deleted.is_some())
    }
}
