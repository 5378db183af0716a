//! Orchestrator error types.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("camera already active")]
    AlreadyActive,

    #[error("camera not active")]
    NotActive,

    #[error("device path update forbidden while camera is active; deactivate first")]
    DeviceChangeWhileActive,

    #[error("capture error: {0}")]
    Capture(#[from] sentry_capture::CaptureError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] sentry_pipeline::PipelineError),

    #[error("stream error: {0}")]
    Stream(#[from] sentry_stream::StreamError),

    #[error("events error: {0}")]
    Events(#[from] sentry_events::EventsError),
}
