//! Detection Pipeline (C5, §4.5): one instance per active camera.

use std::sync::Arc;

use sentry_detect::{DetectionStrategy, DetectorAdapter, Disabled, Hybrid, MotionTriggered, RateLimited, Scheduled};
use sentry_models::{CameraId, EffectivePipelineConfig, PipelineMode, Subscription};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::chain;
use crate::motion::ByteSizeMotionDetector;
use crate::stats::PipelineStats;

pub(crate) struct PipelineState {
    pub strategy: Box<dyn DetectionStrategy>,
    pub detectors: Vec<Arc<dyn DetectorAdapter>>,
    pub mode: PipelineMode,
}

pub(crate) fn build_strategy(config: &EffectivePipelineConfig) -> Box<dyn DetectionStrategy> {
    match config.mode {
        PipelineMode::Disabled => Box::new(Disabled),
        PipelineMode::VisualOnly | PipelineMode::Continuous => Box::new(RateLimited::new(config.min_interval_ms)),
        PipelineMode::MotionTriggered => Box::new(MotionTriggered::new(
            ByteSizeMotionDetector::new(config.motion_sensitivity),
            config.motion_cooldown_ms,
        )),
        PipelineMode::Scheduled => Box::new(Scheduled::new(config.schedule_interval_secs)),
        PipelineMode::Hybrid => Box::new(Hybrid::new(
            config.schedule_interval_secs,
            ByteSizeMotionDetector::new(config.motion_sensitivity),
            config.motion_cooldown_ms,
        )),
    }
}

/// Main loop for one camera's pipeline: `select! { stop, sub.recv() }`,
/// mirroring `vclip-worker::executor::JobExecutor::run`'s shutdown-watch
/// idiom.
pub(crate) async fn run_loop(
    camera_id: CameraId,
    mut sub: Subscription,
    state: Arc<RwLock<PipelineState>>,
    mut stop_rx: watch::Receiver<bool>,
    bus: Arc<EventBus>,
    stats: Arc<PipelineStats>,
) {
    info!(%camera_id, "detection pipeline started");

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    debug!(%camera_id, "detection pipeline stop signal observed");
                    break;
                }
            }
            frame = sub.frames.recv() => {
                let frame = match frame {
                    Some(frame) => frame,
                    None => {
                        debug!(%camera_id, "frame subscription closed, stopping pipeline");
                        break;
                    }
                };

                let guard = state.read().await;
                let should_detect = guard.strategy.should_detect(&frame).await;
                if !should_detect {
                    continue;
                }

                let detectors = guard.detectors.clone();
                let mode = guard.mode;
                drop(guard);

                let outcome = chain::run(&detectors, camera_id, frame.seq, &frame.jpeg).await;

                let guard = state.read().await;
                guard.strategy.on_detection_complete().await;
                drop(guard);

                if let Some((mut merged, _primary)) = outcome {
                    stats.record_detection(merged.timestamp.timestamp_millis(), merged.total_inference_ms);

                    // §9 open-question resolution: the stream overlay (C7)
                    // still needs every publication, so the bus always gets
                    // one; visual_only/disabled only suppress the event
                    // sink's persistence and alert side-effects, decided
                    // here rather than inside the bus itself.
                    merged.events_suppressed = !mode.events_allowed();
                    bus.publish(&merged).await;
                } else {
                    warn!(%camera_id, frame_seq = frame.seq, "all detector stages failed, nothing published");
                }
            }
        }
    }

    info!(%camera_id, "detection pipeline stopped");
}
