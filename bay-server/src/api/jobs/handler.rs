//! Job API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::util::now_millis;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Job, JobCreate, JobFilter, JobUpdate};
use crate::identity::Actor;
use crate::jobs::CompleteJob;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, validate_payload};

/// 可选原因 (拒绝 / 取消 / 改派)
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReasonBody {
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AssignBody {
    #[validate(length(min = 1))]
    pub tech_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReassignBody {
    #[validate(length(min = 1))]
    pub tech_id: String,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NotesBody {
    #[validate(length(max = MAX_NOTE_LEN))]
    pub notes: String,
}

/// 请求体可省略 (无 Content-Type 时视为空对象)
fn body_or_default<T: Default>(body: Option<Json<T>>) -> T {
    body.map(|Json(b)| b).unwrap_or_default()
}

/// GET /api/jobs - 经理: 本店全部工单; 技师: 可见工单
pub async fn list(
    State(state): State<ServerState>,
    actor: Actor,
    Query(filter): Query<JobFilter>,
) -> AppResult<Json<Vec<Job>>> {
    Ok(Json(state.jobs.list(&actor, &filter).await?))
}

/// GET /api/jobs/mine - 分配给自己的工单
pub async fn list_mine(State(state): State<ServerState>, actor: Actor) -> AppResult<Json<Vec<Job>>> {
    Ok(Json(state.jobs.list_mine(&actor).await?))
}

/// GET /api/jobs/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<Job>> {
    Ok(Json(state.jobs.get(&actor, &id).await?))
}

/// POST /api/jobs
pub async fn create(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<JobCreate>,
) -> AppResult<Json<Job>> {
    Ok(Json(state.jobs.create(&actor, payload, now_millis()).await?))
}

/// PUT /api/jobs/{id}
pub async fn update(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<JobUpdate>,
) -> AppResult<Json<Job>> {
    Ok(Json(state.jobs.update(&actor, &id, payload, now_millis()).await?))
}

/// PUT /api/jobs/{id}/notes
pub async fn update_notes(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<NotesBody>,
) -> AppResult<Json<Job>> {
    validate_payload(&payload)?;
    Ok(Json(
        state
            .jobs
            .update_notes(&actor, &id, payload.notes, now_millis())
            .await?,
    ))
}

/// DELETE /api/jobs/{id}
pub async fn delete(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.jobs.delete(&actor, &id).await?;
    Ok(Json(true))
}

/// POST /api/jobs/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<ReasonBody>>,
) -> AppResult<Json<Job>> {
    let body = body_or_default(body);
    validate_payload(&body)?;
    Ok(Json(
        state
            .jobs
            .cancel(&actor, &id, body.reason, now_millis())
            .await?,
    ))
}

/// POST /api/jobs/{id}/approve
pub async fn approve(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<Job>> {
    Ok(Json(
        state.jobs.approve_request(&actor, &id, now_millis()).await?,
    ))
}

/// POST /api/jobs/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<ReasonBody>>,
) -> AppResult<Json<Job>> {
    let body = body_or_default(body);
    validate_payload(&body)?;
    Ok(Json(
        state
            .jobs
            .reject_request(&actor, &id, body.reason, now_millis())
            .await?,
    ))
}

/// POST /api/jobs/{id}/assign
pub async fn assign(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<AssignBody>,
) -> AppResult<Json<Job>> {
    validate_payload(&body)?;
    Ok(Json(
        state
            .jobs
            .direct_assign(&actor, &id, &body.tech_id, now_millis())
            .await?,
    ))
}

/// POST /api/jobs/{id}/reassign
pub async fn reassign(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<ReassignBody>,
) -> AppResult<Json<Job>> {
    validate_payload(&body)?;
    Ok(Json(
        state
            .jobs
            .reassign(&actor, &id, &body.tech_id, body.reason, now_millis())
            .await?,
    ))
}

/// POST /api/jobs/{id}/request
pub async fn request_to_work(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<Job>> {
    Ok(Json(
        state.jobs.request_to_work(&actor, &id, now_millis()).await?,
    ))
}

/// POST /api/jobs/{id}/start
pub async fn start(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<Job>> {
    Ok(Json(state.jobs.start(&actor, &id, now_millis()).await?))
}

/// POST /api/jobs/{id}/complete
pub async fn complete(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<CompleteJob>>,
) -> AppResult<Json<Job>> {
    let payload = body_or_default(body);
    Ok(Json(
        state
            .jobs
            .complete(&actor, &id, payload, now_millis())
            .await?,
    ))
}
