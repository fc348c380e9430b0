//! Incentive Rule API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_manager;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/incentive-rules", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/active", get(handler::active))
        .route("/preview", get(handler::preview));

    let manager_routes = Router::new()
        .route("/", get(handler::list))
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_manager));

    read_routes.merge(manager_routes)
}
