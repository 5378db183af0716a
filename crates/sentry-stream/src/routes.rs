//! Router fragment for the stream overlay endpoints, merged into the
//! binary's top-level router by `sentry-api`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::mjpeg::stream_handler;
use crate::overlay::StreamProvider;
use crate::snapshot::snapshot_handler;
use crate::ws_detections::detections_ws_handler;
use crate::ws_push::video_ws_handler;

pub fn router(provider: Arc<StreamProvider>) -> Router {
    Router::new()
        .route("/video/stream/:camera_id", get(stream_handler))
        .route("/ws/video/:camera_id", get(video_ws_handler))
        .route("/video/snapshot/:camera_id", get(snapshot_handler))
        .route("/ws/detections/:camera_id", get(detections_ws_handler))
        .with_state(provider)
}
