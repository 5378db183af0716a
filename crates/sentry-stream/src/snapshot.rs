//! Snapshot endpoint: `GET /video/snapshot/{camera_id}` (§4.7).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use sentry_models::CameraId;

use crate::overlay::StreamProvider;

pub async fn snapshot_handler(State(provider): State<Arc<StreamProvider>>, Path(camera_id): Path<CameraId>) -> Response {
    match provider.latest_frame(camera_id).await {
        Some(frame) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/jpeg")], frame.jpeg).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
