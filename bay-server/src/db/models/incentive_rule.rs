//! Incentive Rule Model

use super::serde_helpers;
use crate::utils::validation::{MAX_BONUS_PER_UNIT, MAX_NAME_LEN, MAX_NOTE_LEN};
use serde::{Deserialize, Serialize};
use shared::models::CertificationScope;
use surrealdb::RecordId;
use validator::Validate;

pub type IncentiveRuleId = RecordId;

pub const DEFAULT_TIME_SAVED_THRESHOLD: i64 = 30;
pub const DEFAULT_BONUS_PER_UNIT: f64 = 10.0;

/// 奖金规则 (按店铺隔离)
///
/// 允许同时存在多条启用规则，匹配时取最新创建的一条。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveRule {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<IncentiveRuleId>,
    #[serde(with = "serde_helpers::record_id")]
    pub shop: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 每个奖金单位的节省分钟数
    #[serde(default = "default_threshold")]
    pub time_saved_threshold: i64,
    #[serde(default = "default_bonus_per_unit")]
    pub bonus_per_unit: f64,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default = "default_scopes")]
    pub applicable_certs: Vec<CertificationScope>,
    #[serde(with = "serde_helpers::record_id")]
    pub created_by: RecordId,
    #[serde(default)]
    pub effective_from: i64,
    #[serde(default)]
    pub effective_until: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> i64 {
    DEFAULT_TIME_SAVED_THRESHOLD
}

fn default_bonus_per_unit() -> f64 {
    DEFAULT_BONUS_PER_UNIT
}

fn default_scopes() -> Vec<CertificationScope> {
    vec![CertificationScope::All]
}

/// Create rule payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IncentiveRuleCreate {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub description: String,
    #[serde(default = "default_threshold")]
    #[validate(range(min = 1))]
    pub time_saved_threshold: i64,
    #[serde(default = "default_bonus_per_unit")]
    #[validate(range(min = 0.0, max = MAX_BONUS_PER_UNIT))]
    pub bonus_per_unit: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_scopes")]
    #[validate(length(min = 1))]
    pub applicable_certs: Vec<CertificationScope>,
    #[serde(default)]
    pub effective_from: Option<i64>,
    #[serde(default)]
    pub effective_until: Option<i64>,
}

/// Update rule payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IncentiveRuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub time_saved_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = MAX_BONUS_PER_UNIT))]
    pub bonus_per_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub applicable_certs: Option<Vec<CertificationScope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<i64>,
    /// `null` 清空截止时间
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "serde_helpers::double_option"
    )]
    pub effective_until: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Certification;

    #[test]
    fn test_create_defaults() {
        let payload: IncentiveRuleCreate =
            serde_json::from_str(r#"{"name":"Standard"}"#).unwrap();
        assert_eq!(payload.time_saved_threshold, 30);
        assert_eq!(payload.bonus_per_unit, 10.0);
        assert!(payload.is_active);
        assert_eq!(payload.applicable_certs, vec![CertificationScope::All]);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_create_validation() {
        let payload: IncentiveRuleCreate =
            serde_json::from_str(r#"{"name":"Bad","time_saved_threshold":0}"#).unwrap();
        assert!(payload.validate().is_err());

        let payload: IncentiveRuleCreate =
            serde_json::from_str(r#"{"name":"Bad","bonus_per_unit":-1.0}"#).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_bonus_per_unit_upper_bound() {
        let payload: IncentiveRuleCreate =
            serde_json::from_str(r#"{"name":"Huge","bonus_per_unit":1e30}"#).unwrap();
        assert!(payload.validate().is_err());

        let update = IncentiveRuleUpdate {
            bonus_per_unit: Some(MAX_BONUS_PER_UNIT * 2.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let missing: IncentiveRuleUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.effective_until, None);

        let cleared: IncentiveRuleUpdate =
            serde_json::from_str(r#"{"effective_until":null}"#).unwrap();
        assert_eq!(cleared.effective_until, Some(None));
    }

    #[test]
    fn test_scopes_parse() {
        let payload: IncentiveRuleCreate =
            serde_json::from_str(r#"{"name":"EV","applicable_certs":["EV","All"]}"#).unwrap();
        assert_eq!(
            payload.applicable_certs,
            vec![
                CertificationScope::Only(Certification::Ev),
                CertificationScope::All
            ]
        );
    }
}
