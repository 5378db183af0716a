//! Per-camera pipeline statistics (§4.5 "[ADDED] statistics").

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// `detections_total`, `last_detection_time`, rolling `avg_inference_ms`
/// (exponential moving average), updated inline by the pipeline main loop —
/// same direct-atomics style as `sentry_capture::stats::CaptureStats`.
#[derive(Default)]
pub struct PipelineStats {
    detections_total: AtomicU64,
    last_detection_ts_millis: AtomicI64,
    avg_inference_ms_bits: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineStatsSnapshot {
    pub detections_total: u64,
    pub last_detection_ts_millis: i64,
    pub avg_inference_ms: f64,
}

const EMA_ALPHA: f64 = 0.2;

impl PipelineStats {
    pub fn record_detection(&self, ts_millis: i64, inference_ms: u64) {
        self.detections_total.fetch_add(1, Ordering::Relaxed);
        self.last_detection_ts_millis.store(ts_millis, Ordering::Relaxed);

        let prev = f64::from_bits(self.avg_inference_ms_bits.load(Ordering::Relaxed));
        let sample = inference_ms as f64;
        let next = if prev == 0.0 { sample } else { EMA_ALPHA * sample + (1.0 - EMA_ALPHA) * prev };
        self.avg_inference_ms_bits.store(next.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            detections_total: self.detections_total.load(Ordering::Relaxed),
            last_detection_ts_millis: self.last_detection_ts_millis.load(Ordering::Relaxed),
            avg_inference_ms: f64::from_bits(self.avg_inference_ms_bits.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_converges_toward_repeated_sample() {
        let stats = PipelineStats::default();
        for _ in 0..50 {
            stats.record_detection(0, 100);
        }
        assert!((stats.snapshot().avg_inference_ms - 100.0).abs() < 1.0);
    }
}
