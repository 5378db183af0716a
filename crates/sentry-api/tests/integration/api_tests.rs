//! API integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sentry_api::config::ApiConfig;
use sentry_api::routes::create_router;
use sentry_api::state::AppState;

async fn create_test_router() -> axum::Router {
    let config = ApiConfig::default();
    let state = AppState::new(config).await.expect("in-memory state should build without external services");
    create_router(state, None)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = create_test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_disabled_returns_not_found() {
    let app = create_test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// S1-style scenario (§8): create a camera, activate it, fetch stats,
/// deactivate it, delete it.
#[tokio::test]
async fn test_camera_lifecycle() {
    let app = create_test_router().await;

    let create_body = serde_json::json!({
        "name": "front door",
        "device": "http://example.invalid/snapshot.jpg",
        "width": 640,
        "height": 480,
        "fps": 1
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cameras")
                .header("content-type", "application/json")
                .body(Body::from(create_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let camera: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let camera_id = camera["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri(format!("/cameras/{camera_id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::builder().uri(format!("/cameras/{camera_id}/stats")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/cameras/{camera_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_camera_is_not_found() {
    let app = create_test_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/cameras/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = create_test_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/cameras")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT);
}
