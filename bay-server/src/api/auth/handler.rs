//! Authentication Handlers
//!
//! Handles signup, login and the current profile

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use shared::util::now_millis;

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::UserProfile;
use crate::identity::{IdentityError, LoginRequest, LoginResponse, SignupRequest, SignupResponse};

/// Fixed delay for failed logins to blunt credential probing
const AUTH_FAILURE_DELAY_MS: u64 = 300;

/// POST /api/auth/signup
///
/// 经理注册同时创建店铺并返回令牌；技师注册只提交加入申请，不返回令牌。
pub async fn signup(
    State(state): State<ServerState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let response = state.identity.signup(req, now_millis()).await?;
    Ok(Json(response))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    match state.identity.login(req).await {
        Ok(response) => Ok(Json(response)),
        Err(e @ IdentityError::InvalidCredentials) => {
            tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.identity.me(&current_user.id).await?;
    Ok(Json(profile))
}
