//! Analytics API 模块 (仅经理)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_manager;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::dashboard))
        .route("/leaderboard", get(handler::leaderboard))
        .route("/bottlenecks", get(handler::bottlenecks))
        .route("/training-suggestions", get(handler::training_suggestions))
        .route("/overview", get(handler::overview))
        .route("/weekly-trends", get(handler::weekly_trends))
        .layer(middleware::from_fn(require_manager))
}
