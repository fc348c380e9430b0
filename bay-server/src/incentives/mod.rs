//! Incentive Rule Engine Module
//!
//! 规则选择 ([`matcher`]) 与奖金计算 ([`calculator`]) 都是纯函数，
//! [`IncentiveService`] 负责店铺内的规则存取。

mod calculator;
pub mod matcher;
mod service;

pub use calculator::*;
pub use matcher::*;
pub use service::{BonusPreview, IncentiveService};
