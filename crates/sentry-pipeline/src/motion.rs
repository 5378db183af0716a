//! Built-in motion detector consulted by `motion_triggered`/`hybrid`.
//!
//! Decoding JPEG pixel data is explicitly out of scope (spec.md's
//! non-goals exclude "JPEG/MJPEG decoding implementation details beyond
//! byte-boundary framing"), so motion is approximated from the encoded
//! byte-length delta between consecutive frames rather than a pixel diff: a
//! genuinely static scene re-encodes to a near-constant size, while motion
//! perturbs enough macroblocks to move the compressed size noticeably.

use async_trait::async_trait;
use sentry_detect::MotionDetector;
use sentry_models::Frame;
use tokio::sync::Mutex;

pub struct ByteSizeMotionDetector {
    sensitivity: f32,
    last_len: Mutex<Option<usize>>,
}

impl ByteSizeMotionDetector {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity: sensitivity.clamp(0.001, 1.0),
            last_len: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MotionDetector for ByteSizeMotionDetector {
    async fn detect_motion(&self, frame: &Frame) -> Result<bool, String> {
        let current_len = frame.jpeg.len();
        let mut last_len = self.last_len.lock().await;

        let positive = match *last_len {
            Some(prev) if prev > 0 => {
                let delta = (current_len as f32 - prev as f32).abs() / prev as f32;
                delta >= self.sensitivity
            }
            _ => false,
        };

        *last_len = Some(current_len);
        Ok(positive)
    }

    async fn reset(&self) {
        *self.last_len.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sentry_models::CameraId;

    fn frame_of_len(len: usize) -> Frame {
        Frame::new(CameraId::new(), 1, Bytes::from(vec![0u8; len]), 0, 0)
    }

    #[tokio::test]
    async fn large_relative_size_change_is_positive() {
        let detector = ByteSizeMotionDetector::new(0.1);
        assert!(!detector.detect_motion(&frame_of_len(1000)).await.unwrap()); // first frame, no baseline
        assert!(detector.detect_motion(&frame_of_len(2000)).await.unwrap());
    }

    #[tokio::test]
    async fn stable_size_is_negative() {
        let detector = ByteSizeMotionDetector::new(0.1);
        let _ = detector.detect_motion(&frame_of_len(1000)).await;
        assert!(!detector.detect_motion(&frame_of_len(1010)).await.unwrap());
    }
}
