//! HTTP 层: 通过 tower oneshot 调用完整 Router (含认证中间件)

mod common;

use axum::body::{Body, to_bytes};
use bay_server::build_app;
use common::*;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use shared::models::Certification;
use tower::ServiceExt;

async fn call(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = build_app(app.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

async fn manager_token(app: &TestApp) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Morgan",
            "email": "morgan@example.com",
            "password": "secret123",
            "role": "manager",
            "shop_name": "Downtown Auto"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = json_of(&body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["shop"]["code"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["status"], "healthy");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = setup().await;
    let (status, body) = call(&app, "GET", "/api/jobs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_of(&body)["code"], 1001);

    let (status, _) = call(&app, "GET", "/api/jobs", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manager_creates_and_lists_jobs() {
    let app = setup().await;
    let (token, _) = manager_token(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&token),
        Some(json!({
            "title": "Oil Change",
            "required_cert": "Engine",
            "book_time": 45,
            "vehicle": { "make": "Toyota", "model": "Corolla", "year": 2019 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let job = json_of(&body);
    assert_eq!(job["service_order_number"], "SO-001001");
    assert_eq!(job["status"], "available");

    let (status, body) = call(&app, "GET", "/api/jobs?status=available", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_fields_are_rejected() {
    let app = setup().await;
    let (token, _) = manager_token(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&token),
        Some(json!({
            "title": "Oil Change",
            "required_cert": "Engine",
            "book_time": 45,
            "incentive_earned": 500.0
        })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_technician_cannot_use_manager_routes() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    app.technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "tess@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = json_of(&body)["token"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/jobs",
        Some(&token),
        Some(json!({ "title": "Oil Change", "required_cert": "Engine", "book_time": 45 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_of(&body)["code"], 2003);
}

#[tokio::test]
async fn test_validate_code_is_public() {
    let app = setup().await;
    let (_, code) = manager_token(&app).await;

    let uri = format!("/api/shops/validate-code/{}", code.to_lowercase());
    let (status, body) = call(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["shop_name"], "Downtown Auto");

    let (status, body) = call(&app, "GET", "/api/shops/validate-code/XX-0000", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], 3001);
}

#[tokio::test]
async fn test_stale_link_renders_page() {
    let app = setup().await;
    let (manager, _) = app.manager("morgan@example.com").await;
    let job = app.job(&manager, Certification::Engine, 60).await;

    let uri = format!("/api/links/jobs/{}/approve?token=deadbeef", job.id_string());
    let (status, body) = call(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("Link already used or expired"));
}

#[tokio::test]
async fn test_link_approves_request_over_http() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();
    app.state
        .jobs
        .request_to_work(&tess, &job_id, T0)
        .await
        .unwrap();
    let token = app.last_token(
        bay_server::notify::NotificationKind::JobRequestToManager,
        "approve_url",
    );

    let uri = format!("/api/links/jobs/{job_id}/approve?token={token}");
    let (status, body) = call(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Request approved"));

    let (status, body) = call(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Link already used or expired"));
}

#[tokio::test]
async fn test_analytics_overview_for_manager() {
    let app = setup().await;
    let (token, _) = manager_token(&app).await;
    let (status, body) = call(&app, "GET", "/api/analytics/overview", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let overview = json_of(&body);
    assert_eq!(overview["active_technicians"], 0);
    assert_eq!(overview["jobs_by_status"]["available"], 0);
}

#[tokio::test]
async fn test_bonus_preview_bounds_its_inputs() {
    let app = setup().await;
    let (token, _) = manager_token(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/incentive-rules",
        Some(&token),
        Some(json!({ "name": "Standard", "time_saved_threshold": 30, "bonus_per_unit": 10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "GET",
        "/api/incentive-rules/preview?cert=Engine&book_time=120&actual_time=60",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let preview = json_of(&body);
    assert_eq!(preview["units"], 2);
    assert_eq!(preview["bonus"], 20.0);

    let (status, body) = call(
        &app,
        "GET",
        "/api/incentive-rules/preview?cert=Engine&book_time=9000000000000000000&actual_time=0",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], 2);
}

#[tokio::test]
async fn test_rule_rate_above_limit_is_rejected() {
    let app = setup().await;
    let (token, _) = manager_token(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/incentive-rules",
        Some(&token),
        Some(json!({ "name": "Jackpot", "bonus_per_unit": 1e30 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["code"], 2);
}
