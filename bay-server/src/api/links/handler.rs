//! Capability Link Handlers

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;
use shared::AppError;
use shared::util::now_millis;

use super::page;
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl LinkQuery {
    fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

fn outcome<T>(result: Result<T, AppError>, title: &str, body: String) -> Html<String> {
    match result {
        Ok(_) => page::render(title, &body),
        Err(e) => page::from_error(&e),
    }
}

/// GET /api/links/jobs/{id}/approve
pub async fn approve_job(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Html<String> {
    let Some(token) = query.token() else {
        return page::expired();
    };
    let result = state
        .jobs
        .approve_via_token(&id, token, now_millis())
        .await
        .map_err(AppError::from);
    match result {
        Ok(job) => page::render(
            "Request approved",
            &format!(
                "{} ({}) is now assigned.",
                job.title, job.service_order_number
            ),
        ),
        Err(e) => page::from_error(&e),
    }
}

/// GET /api/links/jobs/{id}/reject
pub async fn reject_job(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Html<String> {
    let Some(token) = query.token() else {
        return page::expired();
    };
    let result = state
        .jobs
        .reject_via_token(&id, token, query.reason.clone(), now_millis())
        .await
        .map_err(AppError::from);
    outcome(
        result,
        "Request rejected",
        "The job is available to other technicians again.".to_string(),
    )
}

/// GET /api/links/membership/{id}/approve
pub async fn approve_membership(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Html<String> {
    let Some(token) = query.token() else {
        return page::expired();
    };
    let result = state
        .membership
        .approve_via_token(&id, token, now_millis())
        .await
        .map_err(AppError::from);
    match result {
        Ok(tech) => page::render(
            "Technician approved",
            &format!("{} has joined your shop.", tech.name),
        ),
        Err(e) => page::from_error(&e),
    }
}

/// GET /api/links/membership/{id}/reject
pub async fn reject_membership(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Html<String> {
    let Some(token) = query.token() else {
        return page::expired();
    };
    let result = state
        .membership
        .reject_via_token(&id, token, query.reason.clone(), now_millis())
        .await
        .map_err(AppError::from);
    outcome(
        result,
        "Request rejected",
        "The technician has been notified.".to_string(),
    )
}
