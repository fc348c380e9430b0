//! User Model

use super::serde_helpers;
use crate::auth::Capability;
use serde::{Deserialize, Serialize};
use shared::models::{Certification, MembershipStatus, Role};
use surrealdb::RecordId;

pub type UserId = RecordId;

/// 默认每周奖金目标
pub const DEFAULT_WEEKLY_BONUS_GOAL: f64 = 500.0;
/// 默认基础时薪
pub const DEFAULT_BASE_RATE: f64 = 25.0;

/// User model matching SurrealDB schema
///
/// 技师 `is_active = true` 时必须是 `approved` 且绑定店铺；经理始终 `approved`。
/// 移除成员不删除记录，只清空 `shop` 并置 `is_active = false`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub shop: Option<RecordId>,
    #[serde(default)]
    pub membership_status: MembershipStatus,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub avatar: String,
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    #[serde(default)]
    pub weekly_earnings: f64,
    #[serde(default = "default_weekly_goal")]
    pub weekly_bonus_goal: f64,
    #[serde(default = "default_multiplier")]
    pub bonus_multiplier: f64,
    #[serde(default)]
    pub total_jobs_completed: i64,
    /// 分钟
    #[serde(default)]
    pub total_time_saved: i64,
    #[serde(default)]
    pub efficiency_history: Vec<EfficiencySnapshot>,
    /// 本周统计起点 (毫秒)
    #[serde(default)]
    pub week_started_at: i64,
    /// 加入申请的邮件审批令牌 (仅哈希)
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub rejected_reason: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

fn default_base_rate() -> f64 {
    DEFAULT_BASE_RATE
}

fn default_weekly_goal() -> f64 {
    DEFAULT_WEEKLY_BONUS_GOAL
}

fn default_multiplier() -> f64 {
    1.0
}

/// 每周效率快照 (只追加)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencySnapshot {
    /// YYYY-MM-DD
    pub week_start_date: String,
    /// 工时定额合计 (小时)
    pub flagged_hours: f64,
    /// 实际用时合计 (小时)
    pub clocked_hours: f64,
    pub efficiency_ratio: f64,
    pub bonus_earned: f64,
}

impl User {
    /// 新建用户 (密码已哈希)
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        now: i64,
    ) -> Self {
        Self {
            id: None,
            name,
            email,
            password_hash,
            role,
            certifications: Vec::new(),
            shop: None,
            membership_status: MembershipStatus::default(),
            is_active: true,
            avatar: String::new(),
            base_rate: DEFAULT_BASE_RATE,
            weekly_earnings: 0.0,
            weekly_bonus_goal: DEFAULT_WEEKLY_BONUS_GOAL,
            bonus_multiplier: 1.0,
            total_jobs_completed: 0,
            total_time_saved: 0,
            efficiency_history: Vec::new(),
            week_started_at: now,
            capabilities: Vec::new(),
            rejected_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }

    pub fn holds(&self, cert: Certification) -> bool {
        self.certifications.contains(&cert)
    }

    /// 已批准且在职的本店技师
    pub fn is_approved_member_of(&self, shop: &RecordId) -> bool {
        self.is_technician()
            && self.is_active
            && self.membership_status == MembershipStatus::Approved
            && self.shop.as_ref() == Some(shop)
    }

    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

/// 对外的用户资料 (不含密码哈希与令牌哈希)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub certifications: Vec<Certification>,
    pub shop: Option<String>,
    pub membership_status: MembershipStatus,
    pub is_active: bool,
    pub avatar: String,
    pub base_rate: f64,
    pub weekly_earnings: f64,
    pub weekly_bonus_goal: f64,
    pub bonus_multiplier: f64,
    pub total_jobs_completed: i64,
    pub total_time_saved: i64,
    pub created_at: i64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            certifications: user.certifications.clone(),
            shop: user.shop.as_ref().map(|s| s.to_string()),
            membership_status: user.membership_status,
            is_active: user.is_active,
            avatar: user.avatar.clone(),
            base_rate: user.base_rate,
            weekly_earnings: user.weekly_earnings,
            weekly_bonus_goal: user.weekly_bonus_goal,
            bonus_multiplier: user.bonus_multiplier,
            total_jobs_completed: user.total_jobs_completed,
            total_time_saved: user.total_time_saved,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_hides_secrets() {
        let mut user = User::new(
            "Alice".into(),
            "alice@example.com".into(),
            "$argon2id$secret".into(),
            Role::Technician,
            0,
        );
        user.id = Some(RecordId::from_table_key("user", "alice"));

        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert_eq!(json["id"], "user:alice");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("capabilities").is_none());
    }

    #[test]
    fn test_approved_member_check() {
        let shop = RecordId::from_table_key("shop", "s1");
        let mut user = User::new("T".into(), "t@x.io".into(), String::new(), Role::Technician, 0);
        assert!(!user.is_approved_member_of(&shop));

        user.shop = Some(shop.clone());
        user.membership_status = MembershipStatus::Approved;
        assert!(user.is_approved_member_of(&shop));

        user.is_active = false;
        assert!(!user.is_approved_member_of(&shop));
    }
}
