//! Error type for the stream overlay provider.

use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("no stream registered for this camera")]
    NotFound,

    #[error("stream already registered for this camera")]
    AlreadyRunning,

    #[error("capture error: {0}")]
    Capture(#[from] sentry_capture::CaptureError),
}
