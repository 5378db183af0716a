//! Raw-frame adapter between C2 and C7 (§4.7 "raw" mode): used when
//! detection is disabled for a camera, so the overlay still has something
//! to show. Uses `frame.seq` directly as the stream's sequence number.

use std::sync::Arc;

use sentry_capture::CaptureRegistry;
use sentry_models::CameraId;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::overlay::StreamProvider;

/// Spawns a task forwarding every captured frame straight to the provider.
/// Stops when `stop_rx` fires or the capture subscription closes.
pub async fn spawn_raw_bridge(
    camera_id: CameraId,
    capture_registry: Arc<CaptureRegistry>,
    provider: Arc<StreamProvider>,
    mut stop_rx: watch::Receiver<bool>,
) -> StreamResult<()> {
    let mut sub = capture_registry
        .subscribe(camera_id, 5)
        .await
        .map_err(StreamError::Capture)?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                }
                frame = sub.frames.recv() => {
                    match frame {
                        Some(frame) => provider.set_annotated_frame(camera_id, frame.seq, frame.jpeg).await,
                        None => break,
                    }
                }
            }
        }
        debug!(%camera_id, "raw stream bridge stopped");
    });

    Ok(())
}
