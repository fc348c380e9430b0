//! Analytics API Handlers

use axum::{Json, extract::State};
use shared::util::now_millis;

use crate::analytics::{
    Bottleneck, Dashboard, LeaderboardEntry, Overview, TrainingSuggestion, WeeklyTrend,
};
use crate::core::ServerState;
use crate::identity::Actor;
use crate::utils::AppResult;

/// GET /api/analytics
pub async fn dashboard(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(state.analytics.dashboard(&actor, now_millis()).await?))
}

/// GET /api/analytics/leaderboard
pub async fn leaderboard(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.analytics.leaderboard(&actor).await?))
}

/// GET /api/analytics/bottlenecks
pub async fn bottlenecks(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<Bottleneck>>> {
    Ok(Json(state.analytics.bottlenecks(&actor).await?))
}

/// GET /api/analytics/training-suggestions
pub async fn training_suggestions(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<TrainingSuggestion>>> {
    Ok(Json(state.analytics.training_suggestions(&actor).await?))
}

/// GET /api/analytics/overview
pub async fn overview(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Overview>> {
    Ok(Json(state.analytics.overview(&actor).await?))
}

/// GET /api/analytics/weekly-trends
pub async fn weekly_trends(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<Vec<WeeklyTrend>>> {
    Ok(Json(
        state.analytics.weekly_trends(&actor, now_millis()).await?,
    ))
}
