//! Incentive Rule API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::Certification;
use shared::util::now_millis;

use crate::core::ServerState;
use crate::db::models::{IncentiveRule, IncentiveRuleCreate, IncentiveRuleUpdate};
use crate::identity::Actor;
use crate::incentives::BonusPreview;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub cert: Certification,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub cert: Certification,
    pub book_time: i64,
    pub actual_time: i64,
}

/// GET /api/incentive-rules
pub async fn list(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<IncentiveRule>>> {
    Ok(Json(state.incentives.list(&actor).await?))
}

/// GET /api/incentive-rules/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<IncentiveRule>> {
    Ok(Json(state.incentives.get(&actor, &id).await?))
}

/// POST /api/incentive-rules
pub async fn create(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<IncentiveRuleCreate>,
) -> AppResult<Json<IncentiveRule>> {
    Ok(Json(
        state.incentives.create(&actor, payload, now_millis()).await?,
    ))
}

/// PUT /api/incentive-rules/{id}
pub async fn update(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<IncentiveRuleUpdate>,
) -> AppResult<Json<IncentiveRule>> {
    Ok(Json(
        state
            .incentives
            .update(&actor, &id, payload, now_millis())
            .await?,
    ))
}

/// DELETE /api/incentive-rules/{id}
pub async fn delete(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.incentives.delete(&actor, &id).await?;
    Ok(Json(true))
}

/// GET /api/incentive-rules/active?cert= - 本店当前生效的规则 (可能为空)
pub async fn active(
    State(state): State<ServerState>,
    actor: Actor,
    Query(query): Query<ActiveQuery>,
) -> AppResult<Json<Option<IncentiveRule>>> {
    let shop = actor.shop()?;
    Ok(Json(
        state
            .incentives
            .select_active_rule(shop, query.cert, now_millis())
            .await?,
    ))
}

/// GET /api/incentive-rules/preview?cert=&book_time=&actual_time=
pub async fn preview(
    State(state): State<ServerState>,
    actor: Actor,
    Query(query): Query<PreviewQuery>,
) -> AppResult<Json<BonusPreview>> {
    Ok(Json(
        state
            .incentives
            .preview(
                &actor,
                query.cert,
                query.book_time,
                query.actual_time,
                now_millis(),
            )
            .await?,
    ))
}
