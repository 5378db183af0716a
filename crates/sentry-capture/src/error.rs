//! Error types for frame capture and distribution.

use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capturer already running for this camera")]
    AlreadyRunning,

    #[error("no capturer running for this camera")]
    NotFound,

    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffmpeg exited: {0}")]
    FfmpegFailed(String),

    #[error("HTTP poll failed: {0}")]
    HttpFailed(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized device string: {0}")]
    InvalidDevice(String),
}
