//! MJPEG pull endpoint: `GET /video/stream/{camera_id}` (§4.7).
//!
//! Writes a `multipart/x-mixed-replace` boundary stream; each slot sends the
//! current stored JPEG no faster than the minimum cadence implied by `fps`,
//! waiting on the per-camera `watch::Receiver` instead of a condition
//! variable (the idiomatic tokio equivalent), bounded by a maximum wait so a
//! stalled camera still produces periodic boundary frames.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::stream;
use sentry_models::CameraId;
use tokio::time::Instant;

use crate::overlay::StreamProvider;

const BOUNDARY: &str = "sentrymeshframe";
const MAX_WAIT: Duration = Duration::from_secs(5);
/// Conservative default cadence; `fps`-aware deployments can wrap this
/// handler with a tighter interval.
const MIN_INTERVAL: Duration = Duration::from_millis(66);

fn mjpeg_part(jpeg: &Bytes) -> Bytes {
    let mut buf = BytesMut::with_capacity(jpeg.len() + 128);
    buf.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n", jpeg.len()).as_bytes(),
    );
    buf.extend_from_slice(jpeg);
    buf.extend_from_slice(b"\r\n");
    buf.freeze()
}

pub async fn stream_handler(State(provider): State<Arc<StreamProvider>>, Path(camera_id): Path<CameraId>) -> Response {
    let rx = provider.subscribe(camera_id).await;
    let seed = (rx, Instant::now() - MIN_INTERVAL);

    let body_stream = stream::unfold(seed, move |(mut rx, mut last_sent)| async move {
        loop {
            if let Ok(Err(_)) = tokio::time::timeout(MAX_WAIT, rx.changed()).await {
                return None; // provider shut down, sender dropped
            }

            let elapsed = last_sent.elapsed();
            if elapsed < MIN_INTERVAL {
                tokio::time::sleep(MIN_INTERVAL - elapsed).await;
            }

            let frame = rx.borrow().clone();
            if let Some(frame) = frame {
                last_sent = Instant::now();
                return Some((Ok::<Bytes, Infallible>(mjpeg_part(&frame.jpeg)), (rx, last_sent)));
            }
            // Nothing stored yet for this camera; wait for the next change.
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format!("multipart/x-mixed-replace; boundary={BOUNDARY}"))
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
