//! Shop API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::Certification;
use shared::util::now_millis;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Shop, UserProfile};
use crate::identity::Actor;
use crate::membership::{ShopCodeInfo, ShopUpdate};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_payload};

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct JoinBody {
    #[validate(length(min = 1, max = MAX_SHORT_TEXT_LEN))]
    pub code: String,
    /// 省略时沿用资料中的资质
    #[serde(default)]
    pub certifications: Option<Vec<Certification>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RejectBody {
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub reason: Option<String>,
}

/// GET /api/shops/mine
pub async fn my_shop(State(state): State<ServerState>, actor: Actor) -> AppResult<Json<Shop>> {
    Ok(Json(state.membership.my_shop(&actor).await?))
}

/// GET /api/shops/validate-code/{code}
pub async fn validate_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> AppResult<Json<ShopCodeInfo>> {
    Ok(Json(state.membership.validate_code(&code).await?))
}

/// PUT /api/shops/mine
pub async fn update(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<ShopUpdate>,
) -> AppResult<Json<Shop>> {
    Ok(Json(state.membership.update_shop(&actor, payload).await?))
}

/// POST /api/shops/mine/regenerate-code
pub async fn regenerate_code(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Shop>> {
    Ok(Json(state.membership.regenerate_code(&actor).await?))
}

/// GET /api/shops/mine/pending
pub async fn list_pending(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(state.membership.list_pending(&actor).await?))
}

/// POST /api/shops/mine/technicians/{id}/approve
pub async fn approve(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(
        state.membership.approve(&actor, &id, now_millis()).await?,
    ))
}

/// POST /api/shops/mine/technicians/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
) -> AppResult<Json<UserProfile>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    validate_payload(&body)?;
    Ok(Json(
        state
            .membership
            .reject(&actor, &id, body.reason, now_millis())
            .await?,
    ))
}

/// DELETE /api/shops/mine/technicians/{id}
pub async fn remove(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.membership.remove(&actor, &id, now_millis()).await?))
}

/// POST /api/shops/join - 已注册但未入店的技师提交加入申请
pub async fn join(
    State(state): State<ServerState>,
    actor: Actor,
    Json(body): Json<JoinBody>,
) -> AppResult<Json<UserProfile>> {
    validate_payload(&body)?;
    Ok(Json(
        state
            .membership
            .join(&actor, &body.code, body.certifications, now_millis())
            .await?,
    ))
}
