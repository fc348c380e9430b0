//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录
//! - [`jobs`] - 工单生命周期
//! - [`links`] - 邮件审批链接 (HTML 页面)
//! - [`shops`] - 店铺与成员审批
//! - [`incentive_rules`] - 奖金规则
//! - [`users`] - 用户资料、设置、统计
//! - [`analytics`] - 店铺分析

use axum::Router;

use crate::core::ServerState;

pub mod analytics;
pub mod auth;
pub mod health;
pub mod incentive_rules;
pub mod jobs;
pub mod links;
pub mod shops;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build the Axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(jobs::router())
        .merge(links::router())
        .merge(shops::router())
        .merge(incentive_rules::router())
        .merge(users::router())
        .merge(analytics::router())
}
