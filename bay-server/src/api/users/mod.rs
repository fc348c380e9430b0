//! User API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_manager;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // 本人或本店经理 (服务层判断)
    let read_routes = Router::new()
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/stats", get(handler::stats));

    let manager_routes = Router::new()
        .route("/technicians", get(handler::list_technicians))
        .route("/{id}/settings", put(handler::update_settings))
        .route("/{id}/reset-weekly", post(handler::reset_weekly))
        .layer(middleware::from_fn(require_manager));

    read_routes.merge(manager_routes)
}
