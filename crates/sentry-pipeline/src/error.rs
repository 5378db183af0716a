//! Error type for the detection pipeline and event bus.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline already running for this camera")]
    AlreadyRunning,

    #[error("no pipeline running for this camera")]
    NotFound,

    #[error("capture error: {0}")]
    Capture(#[from] sentry_capture::CaptureError),

    #[error("no detector named \"yolo\" or \"dino\" in the configured detector list")]
    NoPrimaryDetector,
}
