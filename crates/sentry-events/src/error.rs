//! Event sink error types.

use thiserror::Error;

pub type EventsResult<T> = Result<T, EventsError>;

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("camera not found: {0}")]
    CameraNotFound(String),

    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("alert dispatch error: {0}")]
    Dispatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
