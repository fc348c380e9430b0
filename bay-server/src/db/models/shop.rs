//! Shop Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ShopId = RecordId;

/// 店铺 (租户边界)
///
/// `code` 全局唯一、大写存储，可随时重新生成。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<ShopId>,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(with = "serde_helpers::record_id")]
    pub manager: RecordId,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}
