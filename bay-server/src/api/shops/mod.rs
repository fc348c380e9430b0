//! Shop API 模块
//!
//! 店铺资料、加入码与技师成员审批。

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::{require_manager, require_technician};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shops", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/mine", get(handler::my_shop))
        // 公共路由 (注册前调用)
        .route("/validate-code/{code}", get(handler::validate_code));

    let manager_routes = Router::new()
        .route("/mine", axum::routing::put(handler::update))
        .route("/mine/regenerate-code", post(handler::regenerate_code))
        .route("/mine/pending", get(handler::list_pending))
        .route("/mine/technicians/{id}/approve", post(handler::approve))
        .route("/mine/technicians/{id}/reject", post(handler::reject))
        .route("/mine/technicians/{id}", delete(handler::remove))
        .layer(middleware::from_fn(require_manager));

    let technician_routes = Router::new()
        .route("/join", post(handler::join))
        .layer(middleware::from_fn(require_technician));

    read_routes.merge(manager_routes).merge(technician_routes)
}
