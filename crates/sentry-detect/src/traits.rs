//! Detector capability surface (§4.3, §9 "Polymorphism").
//!
//! Detectors are described by their capability set rather than a concrete
//! type; dispatch throughout C5 is by this surface. The `ConditionalRunner`
//! extension is implemented only by adapters whose invocation depends on a
//! prior stage's output (the face adapter: run only after a "person").

use async_trait::async_trait;

use sentry_models::DetectionResult;

use crate::error::DetectResult;

/// Category tag for a detector, used by the detection strategy and the
/// primary-detector selection rule in §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorType {
    Object,
    Face,
    Plate,
}

/// Uniform capability surface implemented by every adapter (§4.3).
#[async_trait]
pub trait DetectorAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn detector_type(&self) -> DetectorType;

    /// Cached health, refreshed on a ~30s window by the adapter itself.
    async fn is_healthy(&self) -> bool;

    /// Detection-only call.
    async fn detect(&self, camera_id: sentry_models::CameraId, frame_seq: u64, jpeg: &bytes::Bytes) -> DetectResult<DetectionResult>;

    /// Detection plus a rendered annotated JPEG.
    async fn detect_annotated(
        &self,
        camera_id: sentry_models::CameraId,
        frame_seq: u64,
        jpeg: &bytes::Bytes,
    ) -> DetectResult<DetectionResult>;

    fn supports_annotation(&self) -> bool;

    /// Release adapter-owned sockets/streams.
    async fn close(&self);

    /// Present only on adapters whose invocation is conditioned on a prior
    /// stage's result (the face adapter). `None` means "always eligible".
    fn as_conditional_runner(&self) -> Option<&dyn ConditionalRunner> {
        None
    }
}

/// Optional extension: detectors that only make sense after a specific
/// upstream class has been observed (§4.3 "Conditional adapter capability").
pub trait ConditionalRunner {
    /// Whether this adapter should run, given the prior stage's result.
    fn should_run(&self, prior: &DetectionResult) -> bool;

    /// Classes that trigger this adapter (e.g. `["person"]` for face).
    fn trigger_classes(&self) -> &[String];
}

/// Default trigger-class check shared by conditional adapters: run iff any
/// prior detection's class label is in `trigger_classes`.
pub fn default_should_run(prior: &DetectionResult, trigger_classes: &[String]) -> bool {
    prior
        .objects
        .iter()
        .any(|o| trigger_classes.iter().any(|c| c == &o.class_label))
}
