//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::util::now_millis;

use crate::core::ServerState;
use crate::db::models::UserProfile;
use crate::identity::{Actor, ProfileUpdate, SettingsUpdate, UserStats};
use crate::utils::AppResult;

/// GET /api/users/technicians - 本店已批准的技师
pub async fn list_technicians(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(state.identity.list_technicians(&actor).await?))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.identity.get_profile(&actor, &id).await?))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(
        state
            .identity
            .update_profile(&actor, &id, payload, now_millis())
            .await?,
    ))
}

/// PUT /api/users/{id}/settings
pub async fn update_settings(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<SettingsUpdate>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(
        state
            .identity
            .update_settings(&actor, &id, payload, now_millis())
            .await?,
    ))
}

/// POST /api/users/{id}/reset-weekly
pub async fn reset_weekly(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(
        state
            .identity
            .reset_weekly(&actor, &id, now_millis())
            .await?,
    ))
}

/// GET /api/users/{id}/stats
pub async fn stats(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<UserStats>> {
    Ok(Json(state.identity.stats(&actor, &id).await?))
}
