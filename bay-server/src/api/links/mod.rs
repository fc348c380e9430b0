//! 邮件审批链接
//!
//! 链接由令牌本身授权 (公共路由)。每种结果都返回 200 + 简单 HTML 页面，
//! 已用过、不匹配或过期的令牌显示 "Link already used or expired"。
//!
//! | 路径 | 方法 |
//! |------|------|
//! | /api/links/jobs/{id}/approve?token= | GET |
//! | /api/links/jobs/{id}/reject?token=&reason= | GET |
//! | /api/links/membership/{id}/approve?token= | GET |
//! | /api/links/membership/{id}/reject?token=&reason= | GET |

mod handler;
mod page;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/links/jobs/{id}/approve", get(handler::approve_job))
        .route("/api/links/jobs/{id}/reject", get(handler::reject_job))
        .route(
            "/api/links/membership/{id}/approve",
            get(handler::approve_membership),
        )
        .route(
            "/api/links/membership/{id}/reject",
            get(handler::reject_membership),
        )
}
