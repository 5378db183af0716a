//! Per-camera capture statistics (§4.1 `GetStats`).

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// `{frames_captured, frames_dropped, last_frame_ts, current_fps}`, updated
/// inline by the capture and distributor tasks — no separate aggregation
/// pass.
#[derive(Default)]
pub struct CaptureStats {
    frames_captured: AtomicU64,
    frames_dropped: AtomicU64,
    last_frame_ts_millis: AtomicI64,
    current_fps_bits: AtomicU64,
}

/// Snapshot returned by `GetStats`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub last_frame_ts_millis: i64,
    pub current_fps: f64,
}

impl CaptureStats {
    pub fn record_frame(&self, ts_millis: i64) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
        self.last_frame_ts_millis.store(ts_millis, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_current_fps(&self, fps: f64) {
        self.current_fps_bits.store(fps.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            last_frame_ts_millis: self.last_frame_ts_millis.load(Ordering::Relaxed),
            current_fps: f64::from_bits(self.current_fps_bits.load(Ordering::Relaxed)),
        }
    }
}

/// Tracks frames emitted within the current 1-second window so the capture
/// task can update `current_fps` without a separate background task.
pub struct FpsWindow {
    window_start: Instant,
    count: u32,
}

impl FpsWindow {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
        }
    }

    /// Call once per emitted frame; updates `stats.current_fps` whenever a
    /// full second has elapsed.
    pub fn tick(&mut self, stats: &CaptureStats) {
        self.count += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs_f64() >= 1.0 {
            stats.set_current_fps(self.count as f64 / elapsed.as_secs_f64());
            self.count = 0;
            self.window_start = Instant::now();
        }
    }
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new()
    }
}
