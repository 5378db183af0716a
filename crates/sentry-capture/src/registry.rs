//! Frame Capturer registry: the process-wide C1 operations surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sentry_models::{CameraId, Subscription};
use tokio::sync::{watch, RwLock};

use crate::device::{classify, DeviceKind};
use crate::distributor::Distributor;
use crate::error::{CaptureError, CaptureResult};
use crate::stats::{CaptureStats, StatsSnapshot};
use crate::{http_poll, process};

struct RunningCapturer {
    distributor: Arc<Distributor>,
    stats: Arc<CaptureStats>,
    cancel_tx: watch::Sender<bool>,
    alive: Arc<AtomicBool>,
}

/// Process-wide singleton owning one capturer per active camera.
#[derive(Default)]
pub struct CaptureRegistry {
    capturers: RwLock<HashMap<CameraId, RunningCapturer>>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Start(camera_id, device, fps, width, height)` (§4.1).
    pub async fn start(
        &self,
        camera_id: CameraId,
        device: &str,
        fps: u32,
        width: u32,
        height: u32,
    ) -> CaptureResult<()> {
        let mut capturers = self.capturers.write().await;
        if capturers.contains_key(&camera_id) {
            return Err(CaptureError::AlreadyRunning);
        }

        let distributor = Arc::new(Distributor::new());
        let stats = Arc::new(CaptureStats::default());
        let alive = Arc::new(AtomicBool::new(true));
        let kind = classify(device);

        let cancel_tx = match kind {
            DeviceKind::HttpPoll => http_poll::spawn(
                camera_id,
                device.to_string(),
                fps,
                width,
                height,
                distributor.clone(),
                stats.clone(),
                alive.clone(),
            ),
            other => process::spawn(
                camera_id,
                device.to_string(),
                other,
                fps,
                width,
                height,
                distributor.clone(),
                stats.clone(),
                alive.clone(),
            )?,
        };

        capturers.insert(
            camera_id,
            RunningCapturer {
                distributor,
                stats,
                cancel_tx,
                alive,
            },
        );
        Ok(())
    }

    /// `Stop(camera_id)`: idempotent, `NotFound` only if called twice
    /// (§4.1).
    pub async fn stop(&self, camera_id: CameraId) -> CaptureResult<()> {
        let removed = self.capturers.write().await.remove(&camera_id);
        match removed {
            Some(capturer) => {
                let _ = capturer.cancel_tx.send(true);
                Ok(())
            }
            None => Err(CaptureError::NotFound),
        }
    }

    /// `Subscribe(camera_id, buffer_size)` (§4.1).
    pub async fn subscribe(&self, camera_id: CameraId, buffer_size: usize) -> CaptureResult<Subscription> {
        let capturers = self.capturers.read().await;
        let capturer = capturers.get(&camera_id).ok_or(CaptureError::NotFound)?;
        let (id, frames, cancel) = capturer.distributor.subscribe(buffer_size).await;
        Ok(Subscription {
            id,
            camera_id,
            frames,
            cancel,
        })
    }

    /// `Unsubscribe(sub)` (§4.1).
    pub async fn unsubscribe(&self, sub: &Subscription) -> CaptureResult<()> {
        let capturers = self.capturers.read().await;
        let capturer = capturers.get(&sub.camera_id).ok_or(CaptureError::NotFound)?;
        capturer.distributor.unsubscribe(sub.id).await;
        Ok(())
    }

    /// True only while the camera's capturer task is still alive: a
    /// subprocess death or read-EOF flips this to false without requiring a
    /// `Stop` call (§4.1).
    pub async fn is_running(&self, camera_id: CameraId) -> bool {
        match self.capturers.read().await.get(&camera_id) {
            Some(capturer) => capturer.alive.load(Ordering::Relaxed),
            None => false,
        }
    }

    pub async fn get_stats(&self, camera_id: CameraId) -> CaptureResult<StatsSnapshot> {
        let capturers = self.capturers.read().await;
        let capturer = capturers.get(&camera_id).ok_or(CaptureError::NotFound)?;
        Ok(capturer.stats.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_without_start_is_not_found() {
        let registry = CaptureRegistry::new();
        let err = registry.stop(CameraId::new()).await.unwrap_err();
        assert!(matches!(err, CaptureError::NotFound));
    }

    #[tokio::test]
    async fn subscribe_without_start_is_not_found() {
        let registry = CaptureRegistry::new();
        let err = registry.subscribe(CameraId::new(), 5).await.unwrap_err();
        assert!(matches!(err, CaptureError::NotFound));
    }

    #[tokio::test]
    async fn is_running_false_initially() {
        let registry = CaptureRegistry::new();
        assert!(!registry.is_running(CameraId::new()).await);
    }
}
