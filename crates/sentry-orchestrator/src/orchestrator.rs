//! Camera Orchestrator (C9, §4.9): translates Activate/Deactivate into
//! lifecycle operations on C1/C5/C7, with compensating rollback on
//! Activate failure. Also the process-wide composition root: it owns the
//! `Arc` handles to every registry and wires the two process-wide C6
//! subscriptions (overlay bridge, event sink) exactly once, following the
//! `AppState`-as-composition-root shape of `vclip-api::state::AppState`.

use std::collections::HashMap;
use std::sync::Arc;

use sentry_capture::CaptureRegistry;
use sentry_detect::DetectorRegistry;
use sentry_events::{AlertDispatcher, EventSink, EventStore};
use sentry_models::{CameraId, CameraStatus, EffectivePipelineConfig, MergedDetectionResult, PipelineMode};
use sentry_pipeline::PipelineRegistry;
use sentry_stream::StreamProvider;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use crate::error::{OrchestratorError, OrchestratorResult};

pub struct CameraOrchestrator<S> {
    capture: Arc<CaptureRegistry>,
    detectors: Arc<DetectorRegistry>,
    pipelines: Arc<PipelineRegistry>,
    stream: Arc<StreamProvider>,
    store: Arc<S>,
    raw_bridges: RwLock<HashMap<CameraId, watch::Sender<bool>>>,
}

impl<S> CameraOrchestrator<S>
where
    S: EventStore + 'static,
{
    /// Builds the orchestrator and wires the two process-wide bus
    /// subscriptions: annotated frames into the stream overlay, and every
    /// publication into the event sink. Generic over the alert dispatcher
    /// only for the duration of this call — the orchestrator itself never
    /// needs to name `A` again once the subscription closure is built.
    pub async fn new<A: AlertDispatcher + 'static>(
        capture: Arc<CaptureRegistry>,
        detectors: Arc<DetectorRegistry>,
        pipelines: Arc<PipelineRegistry>,
        stream: Arc<StreamProvider>,
        store: Arc<S>,
        sink: Arc<EventSink<S, A>>,
    ) -> Self {
        let bus = pipelines.bus();

        let overlay = stream.clone();
        let overlay_handler: sentry_pipeline::Handler = Arc::new(move |result: &MergedDetectionResult| {
            let overlay = overlay.clone();
            let camera_id = result.camera_id;
            let seq = result.frame_seq;
            let jpeg = result.annotated_jpeg.clone();
            let objects = result.objects.clone();
            let faces = result.faces.clone();
            tokio::spawn(async move {
                if let Some(jpeg) = jpeg {
                    overlay.set_annotated_frame(camera_id, seq, jpeg).await;
                }
                overlay.update_detections(camera_id, objects, faces).await;
            });
        });
        bus.subscribe_handler(None, overlay_handler).await;

        let sink_handler: sentry_pipeline::Handler = Arc::new(move |result: &MergedDetectionResult| {
            let sink = sink.clone();
            let result = result.clone();
            tokio::spawn(async move {
                sink.handle(&result).await;
            });
        });
        bus.subscribe_handler(None, sink_handler).await;

        Self {
            capture,
            detectors,
            pipelines,
            stream,
            store,
            raw_bridges: RwLock::new(HashMap::new()),
        }
    }

    /// `Activate(camera_id)` (§4.9): C1.Start, register the C7 raw-frame
    /// fallback bridge when detection is disabled for this camera,
    /// C5.StartCamera, persist `active`. Rolls back in reverse order on any
    /// failure.
    pub async fn activate(&self, camera_id: CameraId, config: EffectivePipelineConfig) -> OrchestratorResult<()> {
        let camera = self.store.load_camera(camera_id).await?;
        self.stream.set_dimensions(camera_id, camera.width, camera.height).await;

        self.capture.start(camera_id, &camera.device, camera.fps, camera.width, camera.height).await?;

        // The raw bridge feeds the overlay's annotated slot directly; it
        // only runs when no detector chain will ever publish to that same
        // slot, else it races the chain's own seq and wins on latency
        // alone, starving the overlay of real detections (§4.7 "raw" mode).
        let raw_bridge_stop = if config.mode == PipelineMode::Disabled {
            let (stop_tx, stop_rx) = watch::channel(false);
            if let Err(e) = sentry_stream::spawn_raw_bridge(camera_id, self.capture.clone(), self.stream.clone(), stop_rx).await {
                warn!(%camera_id, error = %e, "activate: raw bridge registration failed, rolling back capture start");
                let _ = self.capture.stop(camera_id).await;
                return Err(e.into());
            }
            Some(stop_tx)
        } else {
            None
        };

        if let Err(e) = self
            .pipelines
            .start_camera(camera_id, config, self.detectors.as_ref(), self.capture.clone())
            .await
        {
            warn!(%camera_id, error = %e, "activate: pipeline start failed, rolling back");
            if let Some(stop_tx) = &raw_bridge_stop {
                let _ = stop_tx.send(true);
            }
            let _ = self.capture.stop(camera_id).await;
            return Err(e.into());
        }

        if let Some(stop_tx) = raw_bridge_stop {
            self.raw_bridges.write().await.insert(camera_id, stop_tx);
        }
        self.store.set_camera_status(camera_id, CameraStatus::Active).await?;
        info!(%camera_id, "camera activated");
        Ok(())
    }

    /// `Deactivate(camera_id)` (§4.9): C7.DeleteStream, C5.StopCamera,
    /// C1.Stop, persist `inactive`. Idempotent: every step logs and
    /// continues on error instead of aborting partway.
    pub async fn deactivate(&self, camera_id: CameraId) -> OrchestratorResult<()> {
        self.stream.delete_stream(camera_id).await;

        if let Some(stop_tx) = self.raw_bridges.write().await.remove(&camera_id) {
            let _ = stop_tx.send(true);
        }

        if let Err(e) = self.pipelines.stop_camera(camera_id).await {
            warn!(%camera_id, error = %e, "deactivate: pipeline stop failed, continuing");
        }

        if let Err(e) = self.capture.stop(camera_id).await {
            warn!(%camera_id, error = %e, "deactivate: capture stop failed, continuing");
        }

        if let Err(e) = self.store.set_camera_status(camera_id, CameraStatus::Inactive).await {
            error!(%camera_id, error = %e, "deactivate: failed to persist inactive status");
        }

        info!(%camera_id, "camera deactivated");
        Ok(())
    }

    /// Updates a running camera's pipeline configuration in place (mode,
    /// detector list, thresholds) without a stop/restart cycle (§4.5).
    pub async fn update_pipeline_config(&self, camera_id: CameraId, config: EffectivePipelineConfig) -> OrchestratorResult<()> {
        self.pipelines.update_config(camera_id, config, self.detectors.as_ref()).await?;
        Ok(())
    }

    /// Name/resolution/fps update while active (§4.9): stop, apply, restart.
    pub async fn restart_with(&self, camera_id: CameraId, config: EffectivePipelineConfig) -> OrchestratorResult<()> {
        self.deactivate(camera_id).await?;
        self.activate(camera_id, config).await
    }

    /// Enforces §4.9's "device path update forbidden while active" rule for
    /// callers updating a camera record (e.g. `sentry-api`'s admin routes).
    pub fn check_device_change_allowed(is_active: bool, device_changed: bool) -> OrchestratorResult<()> {
        if is_active && device_changed {
            return Err(OrchestratorError::DeviceChangeWhileActive);
        }
        Ok(())
    }

    /// Deactivates every currently active camera. Called from `main`'s
    /// shutdown handler so capture subprocesses and pipeline workers are
    /// torn down cleanly instead of left running past process exit.
    pub async fn shutdown_all(&self) {
        let cameras = match self.store.list_cameras().await {
            Ok(cameras) => cameras,
            Err(e) => {
                error!(error = %e, "shutdown_all: failed to list cameras, nothing to deactivate");
                return;
            }
        };

        for camera in cameras.into_iter().filter(|c| c.status == CameraStatus::Active) {
            if let Err(e) = self.deactivate(camera.id).await {
                warn!(camera_id = %camera.id, error = %e, "shutdown_all: failed to deactivate camera");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentry_detect::DetectorRegistry;
    use sentry_events::{CooldownCache, EventSink, InMemoryAlertDispatcher, InMemoryEventStore, ThumbnailWriter};
    use sentry_models::CameraRecord;
    use sentry_pipeline::{EventBus, PipelineRegistry};
    use std::time::Duration;

    async fn build_orchestrator(camera: CameraRecord) -> (CameraOrchestrator<InMemoryEventStore>, Arc<InMemoryEventStore>) {
        let capture = Arc::new(CaptureRegistry::new());
        let detectors = Arc::new(DetectorRegistry::new());
        let pipelines = Arc::new(PipelineRegistry::new(Arc::new(EventBus::new())));
        let stream = Arc::new(StreamProvider::new());
        let store = Arc::new(InMemoryEventStore::new().with_camera(camera));
        let dispatcher = Arc::new(InMemoryAlertDispatcher::new());
        let dir = tempfile::tempdir().unwrap();
        let thumbnails = Arc::new(ThumbnailWriter::new(dir.path().to_path_buf()));
        let cooldown = Arc::new(CooldownCache::new(Duration::from_secs(30)));
        let sink = Arc::new(EventSink::new(store.clone(), dispatcher, thumbnails, cooldown));

        let orchestrator = CameraOrchestrator::new(capture, detectors, pipelines, stream, store.clone(), sink).await;
        (orchestrator, store)
    }

    #[tokio::test]
    async fn activate_then_deactivate_flips_status() {
        let camera = CameraRecord::new("front door", "http://example.invalid/image.jpg", 640, 480, 1);
        let camera_id = camera.id;
        let (orchestrator, store) = build_orchestrator(camera).await;

        orchestrator.activate(camera_id, EffectivePipelineConfig::default()).await.unwrap();
        assert_eq!(store.load_camera(camera_id).await.unwrap().status, CameraStatus::Active);

        orchestrator.deactivate(camera_id).await.unwrap();
        assert_eq!(store.load_camera(camera_id).await.unwrap().status, CameraStatus::Inactive);
    }

    #[tokio::test]
    async fn activate_unknown_camera_errors_without_starting_anything() {
        let camera = CameraRecord::new("front door", "http://example.invalid/image.jpg", 640, 480, 1);
        let (orchestrator, _store) = build_orchestrator(camera).await;
        let err = orchestrator.activate(CameraId::new(), EffectivePipelineConfig::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn activate_twice_fails_on_second_call() {
        let camera = CameraRecord::new("front door", "http://example.invalid/image.jpg", 640, 480, 1);
        let camera_id = camera.id;
        let (orchestrator, _store) = build_orchestrator(camera).await;

        orchestrator.activate(camera_id, EffectivePipelineConfig::default()).await.unwrap();
        let err = orchestrator.activate(camera_id, EffectivePipelineConfig::default()).await;
        assert!(matches!(err, Err(OrchestratorError::Capture(_))));

        orchestrator.deactivate(camera_id).await.unwrap();
    }

    #[tokio::test]
    async fn deactivate_without_activate_is_tolerated() {
        let camera = CameraRecord::new("front door", "http://example.invalid/image.jpg", 640, 480, 1);
        let camera_id = camera.id;
        let (orchestrator, store) = build_orchestrator(camera).await;

        orchestrator.deactivate(camera_id).await.unwrap();
        assert_eq!(store.load_camera(camera_id).await.unwrap().status, CameraStatus::Inactive);
    }

    #[test]
    fn device_change_while_active_is_rejected() {
        assert!(CameraOrchestrator::<InMemoryEventStore>::check_device_change_allowed(true, true).is_err());
        assert!(CameraOrchestrator::<InMemoryEventStore>::check_device_change_allowed(true, false).is_ok());
        assert!(CameraOrchestrator::<InMemoryEventStore>::check_device_change_allowed(false, true).is_ok());
    }
}
