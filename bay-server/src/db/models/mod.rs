//! Database Models

// Serde helpers
pub mod serde_helpers;

// Identity
pub mod shop;
pub mod user;

// Work
pub mod job;

// Incentives
pub mod incentive_rule;

// Re-exports
pub use incentive_rule::{IncentiveRule, IncentiveRuleCreate, IncentiveRuleId, IncentiveRuleUpdate};
pub use job::{AuditEntry, Job, JobCreate, JobFilter, JobId, JobUpdate, VehicleInfo};
pub use shop::{Shop, ShopId};
pub use user::{EfficiencySnapshot, User, UserId, UserProfile};
