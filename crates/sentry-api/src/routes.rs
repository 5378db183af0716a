//! Top-level router: merges the C7 stream overlay router with the camera
//! admin surface, following `vclip_api::routes::create_router`'s
//! merge-then-layer shape.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::cameras::{
    activate_camera, camera_stats, create_camera, deactivate_camera, delete_camera, get_camera, list_cameras, update_camera,
};
use crate::handlers::health::{health, ready};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let camera_routes = Router::new()
        .route("/cameras", get(list_cameras).post(create_camera))
        .route("/cameras/:camera_id", get(get_camera).patch(update_camera).delete(delete_camera))
        .route("/cameras/:camera_id/activate", post(activate_camera))
        .route("/cameras/:camera_id/deactivate", post(deactivate_camera))
        .route("/cameras/:camera_id/stats", get(camera_stats));

    let health_routes = Router::new().route("/health", get(health)).route("/healthz", get(health)).route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let stream_router = sentry_stream::router(state.stream.clone());

    Router::new()
        .merge(camera_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .with_state(state)
        .merge(stream_router)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
