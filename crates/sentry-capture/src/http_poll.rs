//! HTTP polling capturer for single-image camera endpoints (§4.1).
//!
//! Each response body is one complete JPEG frame; no SOI/EOI framing is
//! needed since the whole body is the frame. Poll failures log and
//! continue — the ticker is never paused (§4.1 failure semantics).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sentry_models::{CameraId, Frame};
use tokio::sync::watch;
use tracing::warn;

use crate::distributor::Distributor;
use crate::stats::{CaptureStats, FpsWindow};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn spawn(
    camera_id: CameraId,
    url: String,
    fps: u32,
    width: u32,
    height: u32,
    distributor: Arc<Distributor>,
    stats: Arc<CaptureStats>,
    alive: Arc<AtomicBool>,
) -> watch::Sender<bool> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(poll_loop(
        camera_id,
        url,
        fps,
        width,
        height,
        distributor,
        stats,
        cancel_rx,
        alive,
    ));
    cancel_tx
}

async fn poll_loop(
    camera_id: CameraId,
    url: String,
    fps: u32,
    width: u32,
    height: u32,
    distributor: Arc<Distributor>,
    stats: Arc<CaptureStats>,
    mut cancel_rx: watch::Receiver<bool>,
    alive: Arc<AtomicBool>,
) {
    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            warn!(camera = %camera_id, error = %e, "failed to build HTTP client, capturer exiting");
            alive.store(false, Ordering::Relaxed);
            return;
        }
    };

    let interval_ms = (1000 / fps.max(1)).max(100) as u64;
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    let mut seq: u64 = 0;
    let mut fps_window = FpsWindow::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                if *cancel_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                match client.get(&url).send().await {
                    Ok(resp) => match resp.bytes().await {
                        Ok(body) if !body.is_empty() => {
                            seq += 1;
                            let frame = Frame::new(camera_id, seq, body, width, height);
                            stats.record_frame(Utc::now().timestamp_millis());
                            fps_window.tick(&stats);
                            distributor.distribute(&frame, &stats).await;
                        }
                        Ok(_) => warn!(camera = %camera_id, "HTTP poll returned empty body"),
                        Err(e) => warn!(camera = %camera_id, error = %e, "HTTP poll body read failed"),
                    },
                    Err(e) => warn!(camera = %camera_id, error = %e, "HTTP poll request failed"),
                }
            }
        }
    }

    alive.store(false, Ordering::Relaxed);
    distributor.close_all().await;
}
