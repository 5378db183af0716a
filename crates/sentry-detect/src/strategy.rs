//! Detection Strategy (C4, §4.4): decides, per frame, whether to invoke
//! the detection chain.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sentry_models::Frame;
use tokio::sync::Mutex;

/// External motion detector consulted by `motion_triggered`/`hybrid`.
///
/// On error the conservative policy is to return true (§4.4) — callers
/// should encode that fallback at the call site, not inside the detector.
#[async_trait]
pub trait MotionDetector: Send + Sync {
    async fn detect_motion(&self, frame: &Frame) -> Result<bool, String>;
    async fn reset(&self);
}

/// `{ShouldDetect(frame, last_result) -> bool; OnDetectionComplete(result);
/// Reset()}` (§4.4). Strategies serialize internally so `ShouldDetect` and
/// `OnDetectionComplete` are safe under concurrent calls (§5 invariant c).
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    async fn should_detect(&self, frame: &Frame) -> bool;
    async fn on_detection_complete(&self);
    async fn reset(&self);
}

/// Defaults per §4.4.
pub const DEFAULT_MOTION_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_MOTION_COOLDOWN_MS: u64 = 2000;
pub const DEFAULT_SCHEDULE_INTERVAL_SECS: u64 = 5;

pub struct Disabled;

#[async_trait]
impl DetectionStrategy for Disabled {
    async fn should_detect(&self, _frame: &Frame) -> bool {
        false
    }
    async fn on_detection_complete(&self) {}
    async fn reset(&self) {}
}

/// Shared by `visual_only` and `continuous`: every frame, optionally rate
/// limited by `min_interval`.
pub struct RateLimited {
    min_interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl RateLimited {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            last_run: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DetectionStrategy for RateLimited {
    async fn should_detect(&self, _frame: &Frame) -> bool {
        if self.min_interval.is_zero() {
            return true;
        }
        let mut last_run = self.last_run.lock().await;
        let now = Instant::now();
        let allow = match *last_run {
            Some(last) => now.duration_since(last) >= self.min_interval,
            None => true,
        };
        if allow {
            *last_run = Some(now);
        }
        allow
    }
    async fn on_detection_complete(&self) {}
    async fn reset(&self) {
        *self.last_run.lock().await = None;
    }
}

struct MotionState {
    active_motion: bool,
    last_motion_time: Option<Instant>,
}

/// Runs the external motion detector each frame; on a positive result sets
/// `active_motion` and records `last_motion_time`; while active and within
/// the cooldown window, keeps returning true even on negative frames.
pub struct MotionTriggered<D: MotionDetector> {
    detector: D,
    cooldown: Duration,
    state: Mutex<MotionState>,
}

impl<D: MotionDetector> MotionTriggered<D> {
    pub fn new(detector: D, cooldown_ms: u64) -> Self {
        Self {
            detector,
            cooldown: Duration::from_millis(cooldown_ms),
            state: Mutex::new(MotionState {
                active_motion: false,
                last_motion_time: None,
            }),
        }
    }
}

#[async_trait]
impl<D: MotionDetector> DetectionStrategy for MotionTriggered<D> {
    async fn should_detect(&self, frame: &Frame) -> bool {
        // Conservative policy: detector errors count as positive motion.
        let positive = self.detector.detect_motion(frame).await.unwrap_or(true);
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if positive {
            state.active_motion = true;
            state.last_motion_time = Some(now);
            return true;
        }

        match state.last_motion_time {
            Some(last) if state.active_motion && now.duration_since(last) < self.cooldown => true,
            _ => {
                state.active_motion = false;
                false
            }
        }
    }

    async fn on_detection_complete(&self) {}

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.active_motion = false;
        state.last_motion_time = None;
        self.detector.reset().await;
    }
}

/// `now - last_scheduled >= schedule_interval`.
pub struct Scheduled {
    interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl Scheduled {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            last_run: Mutex::new(None),
        }
    }

    async fn due(&self) -> bool {
        let last_run = self.last_run.lock().await;
        match *last_run {
            Some(last) => Instant::now().duration_since(last) >= self.interval,
            None => true,
        }
    }

    async fn advance(&self) {
        *self.last_run.lock().await = Some(Instant::now());
    }
}

#[async_trait]
impl DetectionStrategy for Scheduled {
    async fn should_detect(&self, _frame: &Frame) -> bool {
        self.due().await
    }
    async fn on_detection_complete(&self) {
        self.advance().await;
    }
    async fn reset(&self) {
        *self.last_run.lock().await = None;
    }
}

/// Scheduled check OR motion check (logical OR); the scheduled timestamp
/// is advanced by `OnDetectionComplete`.
pub struct Hybrid<D: MotionDetector> {
    scheduled: Scheduled,
    motion: MotionTriggered<D>,
}

impl<D: MotionDetector> Hybrid<D> {
    pub fn new(schedule_interval_secs: u64, motion_detector: D, motion_cooldown_ms: u64) -> Self {
        Self {
            scheduled: Scheduled::new(schedule_interval_secs),
            motion: MotionTriggered::new(motion_detector, motion_cooldown_ms),
        }
    }
}

#[async_trait]
impl<D: MotionDetector> DetectionStrategy for Hybrid<D> {
    async fn should_detect(&self, frame: &Frame) -> bool {
        let scheduled_due = self.scheduled.due().await;
        let motion_triggered = self.motion.should_detect(frame).await;
        scheduled_due || motion_triggered
    }

    async fn on_detection_complete(&self) {
        self.scheduled.advance().await;
        self.motion.on_detection_complete().await;
    }

    async fn reset(&self) {
        self.scheduled.reset().await;
        self.motion.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sentry_models::CameraId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn frame() -> Frame {
        Frame::new(CameraId::new(), 1, Bytes::from_static(b"jpeg"), 0, 0)
    }

    struct ScriptedMotion {
        calls: AtomicUsize,
        positives: Vec<bool>,
    }

    #[async_trait]
    impl MotionDetector for ScriptedMotion {
        async fn detect_motion(&self, _frame: &Frame) -> Result<bool, String> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(*self.positives.get(i).unwrap_or(&false))
        }
        async fn reset(&self) {}
    }

    #[tokio::test]
    async fn motion_cooldown_holds_true_until_expiry() {
        let detector = ScriptedMotion {
            calls: AtomicUsize::new(0),
            positives: vec![true, false, false],
        };
        let strategy = MotionTriggered::new(detector, 50);

        assert!(strategy.should_detect(&frame()).await); // positive
        assert!(strategy.should_detect(&frame()).await); // within cooldown
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!strategy.should_detect(&frame()).await); // cooldown expired
    }

    #[tokio::test]
    async fn disabled_never_detects() {
        let strategy = Disabled;
        assert!(!strategy.should_detect(&frame()).await);
    }

    #[tokio::test]
    async fn scheduled_fires_once_until_advanced() {
        let strategy = Scheduled::new(0);
        assert!(strategy.should_detect(&frame()).await);
    }

    #[tokio::test]
    async fn hybrid_is_logical_or_of_scheduled_and_motion() {
        let detector = ScriptedMotion {
            calls: AtomicUsize::new(0),
            positives: vec![false],
        };
        // schedule_interval=0 means scheduled is always due, so hybrid
        // should detect even though motion is negative.
        let strategy = Hybrid::new(0, detector, 2000);
        assert!(strategy.should_detect(&frame()).await);
    }

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[test]
    fn strategies_are_send_sync() {
        assert_send_sync::<Disabled>();
        assert_send_sync::<RateLimited>();
        let _ = Arc::new(Disabled);
    }
}
