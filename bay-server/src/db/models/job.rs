//! Job Model

use super::serde_helpers;
use crate::auth::Capability;
use crate::utils::validation::{
    MAX_JOB_MINUTES, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_TITLE_LEN,
};
use serde::{Deserialize, Serialize};
use shared::models::{AssignmentType, Certification, JobStatus, Priority, RequestStatus};
use surrealdb::RecordId;
use validator::Validate;

pub type JobId = RecordId;

/// 车辆信息 (自由文本)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VehicleInfo {
    #[serde(default)]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub make: String,
    #[serde(default)]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub model: String,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[serde(default)]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub vin: String,
}

/// 审计记录 (只追加)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: i64,
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Job model matching SurrealDB schema
///
/// | 状态 | 约束 |
/// |------|------|
/// | in-progress | `assigned_tech` 与 `started_at` 非空 |
/// | completed | `actual_time`、`completed_at` 非空，`incentive_earned >= 0` |
///
/// `shop` 创建后不可变。`revision` 每次写入递增，用作条件更新的期望值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<JobId>,
    pub service_order_number: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vehicle: VehicleInfo,
    pub required_cert: Certification,
    /// 工时定额 (分钟)
    pub book_time: i64,
    /// 实际用时 (分钟), 完成时写入
    #[serde(default)]
    pub actual_time: Option<i64>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_tech: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub created_by: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub shop: RecordId,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub incentive_earned: f64,
    #[serde(default)]
    pub time_saved: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub assignment_type: AssignmentType,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub requested_by: Option<RecordId>,
    #[serde(default)]
    pub request_status: RequestStatus,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub approved_by: Option<RecordId>,
    #[serde(default)]
    pub approved_at: Option<i64>,
    #[serde(default)]
    pub rejected_reason: Option<String>,
    /// 请求审批链接令牌 (仅哈希)
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
    #[serde(default)]
    pub revision: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Job {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn is_assigned_to(&self, user: &RecordId) -> bool {
        self.assigned_tech.as_ref() == Some(user)
    }
}

/// Create job payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct JobCreate {
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub description: String,
    #[serde(default)]
    #[validate(nested)]
    pub vehicle: VehicleInfo,
    pub required_cert: Certification,
    #[validate(range(min = 1, max = MAX_JOB_MINUTES))]
    pub book_time: i64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub notes: String,
}

/// Update job payload (descriptive fields only)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub vehicle: Option<VehicleInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = MAX_JOB_MINUTES))]
    pub book_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_cert: Option<Certification>,
}

/// 列表过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub required_cert: Option<Certification>,
    pub priority: Option<Priority>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_tech: Option<RecordId>,
}
