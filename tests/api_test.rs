use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use x402_scout::api;
use x402_scout::config::Config;

/// Builds a test app with isolated dependencies
async fn build_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.server.data_path = temp_dir.path().join("store");
    config.crawler.partners_dir = temp_dir.path().join("partners");
    std::fs::create_dir_all(&config.crawler.partners_dir).unwrap();

    let state = api::build_state(config).await.expect("Failed to build state");
    (api::router(state), temp_dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["store"], "healthy");
    // The scheduler only runs under the server command, not in tests.
    assert_eq!(body["components"]["crawler"], "stopped");
}

#[tokio::test]
async fn test_add_endpoint_then_conflict() {
    let (app, _temp) = build_test_app().await;

    let request = |url: &str| {
        Request::builder()
            .method("POST")
            .uri("/endpoints")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"url": url}).to_string()))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(request("https://api.example.com/v1/pay"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["added"], true);

    // Same URL again: accepted but not re-added.
    let response = app
        .clone()
        .oneshot(request("https://api.example.com/v1/pay"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["added"], false);
}

#[tokio::test]
async fn test_add_endpoint_rejects_bad_url() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/endpoints")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"url": "ftp://nope"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_list_resources_empty() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/resources?q=weather")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
    assert!(body["resources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_resources_rejects_unknown_source() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/resources?source=mystery")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn test_progress_starts_idle() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/discovery/progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "idle");
    assert_eq!(body["totalDiscovered"], 0);
}

#[tokio::test]
async fn test_stats_endpoint_shape() {
    let (app, _temp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/discovery/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["resources"]["total"], 0);
    assert_eq!(body["endpoints"]["totalDiscovered"], 0);
    assert_eq!(body["metrics"]["crawlCycles"], 0);
    assert_eq!(body["crawlerRunning"], false);
}
