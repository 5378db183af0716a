//! Prometheus metrics (§9 ambient stack), same crate choice and middleware
//! shape as `vclip_api::metrics`.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "sentry_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sentry_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sentry_http_requests_in_flight";
    pub const WS_CONNECTIONS_ACTIVE: &str = "sentry_ws_connections_active";
    pub const CAMERAS_ACTIVE: &str = "sentry_cameras_active";
}

fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .unwrap()
        .replace_all(path, ":id");
    path.to_string()
}

pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = sanitize_path(request.uri().path());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    let labels = [("method", method), ("path", path), ("status", status.to_string())];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_uuid_segments() {
        assert_eq!(sanitize_path("/cameras/550e8400-e29b-41d4-a716-446655440000"), "/cameras/:id");
    }
}
