//! Incentive Rule Matcher
//!
//! 多条规则可同时启用，按创建时间取最新的一条；创建时间相同按 ID 比较，保证结果确定。

use crate::db::models::IncentiveRule;
use shared::models::Certification;
use std::cmp::Ordering;

/// Check if a rule covers the certification and is in force at `as_of`
pub fn is_applicable(rule: &IncentiveRule, cert: Certification, as_of: i64) -> bool {
    rule.is_active
        && rule.applicable_certs.iter().any(|scope| scope.covers(cert))
        && rule.effective_until.is_none_or(|until| until >= as_of)
}

/// Recency order: newer `created_at` first, then larger id
fn recency(a: &IncentiveRule, b: &IncentiveRule) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| {
        let a_id = a.id.as_ref().map(|id| id.to_string());
        let b_id = b.id.as_ref().map(|id| id.to_string());
        a_id.cmp(&b_id)
    })
}

/// Pick the rule that governs a job of `cert` at `as_of`, if any
pub fn select_active_rule(
    rules: &[IncentiveRule],
    cert: Certification,
    as_of: i64,
) -> Option<&IncentiveRule> {
    rules
        .iter()
        .filter(|rule| is_applicable(rule, cert, as_of))
        .max_by(|a, b| recency(a, b))
}
