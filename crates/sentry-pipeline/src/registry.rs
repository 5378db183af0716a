//! Process-wide registry of active detection pipelines (C5 operations
//! surface: `StartCamera`, `StopCamera`, `UpdateConfig`).

use std::collections::HashMap;
use std::sync::Arc;

use sentry_capture::CaptureRegistry;
use sentry_detect::DetectorRegistry;
use sentry_models::{CameraId, EffectivePipelineConfig};
use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::bus::EventBus;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{build_strategy, run_loop, PipelineState};
use crate::stats::{PipelineStats, PipelineStatsSnapshot};

struct RunningPipeline {
    state: Arc<RwLock<PipelineState>>,
    stats: Arc<PipelineStats>,
    stop_tx: watch::Sender<bool>,
}

pub struct PipelineRegistry {
    pipelines: RwLock<HashMap<CameraId, RunningPipeline>>,
    bus: Arc<EventBus>,
}

impl PipelineRegistry {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
            bus,
        }
    }

    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// `StartCamera` (§4.5): subscribes to C2 for this camera with buffer 5,
    /// resolves the ordered healthy detector slice, builds the strategy, and
    /// spawns the main loop.
    pub async fn start_camera(
        &self,
        camera_id: CameraId,
        config: EffectivePipelineConfig,
        detector_registry: &DetectorRegistry,
        capture_registry: Arc<CaptureRegistry>,
    ) -> PipelineResult<()> {
        let mut pipelines = self.pipelines.write().await;
        if pipelines.contains_key(&camera_id) {
            return Err(PipelineError::AlreadyRunning);
        }

        let sub = capture_registry.subscribe(camera_id, 5).await?;
        let detectors = detector_registry.get_healthy_by_names(&config.detectors).await;
        let strategy = build_strategy(&config);

        let state = Arc::new(RwLock::new(PipelineState {
            strategy,
            detectors,
            mode: config.mode,
        }));
        let stats = Arc::new(PipelineStats::default());
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(run_loop(camera_id, sub, state.clone(), stop_rx, self.bus.clone(), stats.clone()));

        pipelines.insert(camera_id, RunningPipeline { state, stats, stop_tx });
        info!(%camera_id, mode = config.mode.as_str(), detectors = config.detectors.len(), "pipeline registered");
        Ok(())
    }

    /// `StopCamera` (§4.5): idempotent within the registry (returns
    /// `NotFound` only if called on an already-stopped camera). The loop
    /// observes the stop signal and exits within ~100ms.
    pub async fn stop_camera(&self, camera_id: CameraId) -> PipelineResult<()> {
        let removed = self.pipelines.write().await.remove(&camera_id);
        match removed {
            Some(running) => {
                let _ = running.stop_tx.send(true);
                Ok(())
            }
            None => Err(PipelineError::NotFound),
        }
    }

    /// `UpdateConfig` (§4.5 "Configuration updates"): rebuilds the strategy
    /// and/or detector slice under the pipeline's own lock, without
    /// restarting the subscription.
    pub async fn update_config(
        &self,
        camera_id: CameraId,
        config: EffectivePipelineConfig,
        detector_registry: &DetectorRegistry,
    ) -> PipelineResult<()> {
        let pipelines = self.pipelines.read().await;
        let running = pipelines.get(&camera_id).ok_or(PipelineError::NotFound)?;

        let detectors = detector_registry.get_healthy_by_names(&config.detectors).await;
        let strategy = build_strategy(&config);

        let mut state = running.state.write().await;
        state.strategy = strategy;
        state.detectors = detectors;
        state.mode = config.mode;
        Ok(())
    }

    pub async fn is_running(&self, camera_id: CameraId) -> bool {
        self.pipelines.read().await.contains_key(&camera_id)
    }

    pub async fn get_stats(&self, camera_id: CameraId) -> PipelineResult<PipelineStatsSnapshot> {
        let pipelines = self.pipelines.read().await;
        let running = pipelines.get(&camera_id).ok_or(PipelineError::NotFound)?;
        Ok(running.stats.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_without_start_is_not_found() {
        let registry = PipelineRegistry::new(Arc::new(EventBus::new()));
        let err = registry.stop_camera(CameraId::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound));
    }

    #[tokio::test]
    async fn is_running_false_initially() {
        let registry = PipelineRegistry::new(Arc::new(EventBus::new()));
        assert!(!registry.is_running(CameraId::new()).await);
    }

    #[tokio::test]
    async fn start_without_capture_running_fails() {
        let registry = PipelineRegistry::new(Arc::new(EventBus::new()));
        let detector_registry = DetectorRegistry::new();
        let capture_registry = Arc::new(CaptureRegistry::new());
        let err = registry
            .start_camera(CameraId::new(), EffectivePipelineConfig::default(), &detector_registry, capture_registry)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Capture(_)));
    }
}
