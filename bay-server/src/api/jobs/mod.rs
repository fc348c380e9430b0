//! Job API 模块
//!
//! | 路径 | 方法 | 角色 |
//! |------|------|------|
//! | /api/jobs | GET | 任意 |
//! | /api/jobs/mine | GET | 技师 |
//! | /api/jobs/{id} | GET | 任意 |
//! | /api/jobs/{id}/notes | PUT | 经理或负责技师 |
//! | /api/jobs | POST | 经理 |
//! | /api/jobs/{id} | PUT / DELETE | 经理 |
//! | /api/jobs/{id}/{cancel,approve,reject,assign,reassign} | POST | 经理 |
//! | /api/jobs/{id}/{request,start,complete} | POST | 技师 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{require_manager, require_technician};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/jobs", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/notes", put(handler::update_notes));

    let manager_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/reassign", post(handler::reassign))
        .layer(middleware::from_fn(require_manager));

    let technician_routes = Router::new()
        .route("/mine", get(handler::list_mine))
        .route("/{id}/request", post(handler::request_to_work))
        .route("/{id}/start", post(handler::start))
        .route("/{id}/complete", post(handler::complete))
        .layer(middleware::from_fn(require_technician));

    read_routes.merge(manager_routes).merge(technician_routes)
}
