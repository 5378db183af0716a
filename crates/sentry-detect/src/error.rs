//! Error types for detector adapters.

use thiserror::Error;

pub type DetectResult<T> = Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detector {0} already registered")]
    AlreadyRegistered(String),

    #[error("no detector named {0}")]
    NotFound(String),

    #[error("detector is unhealthy")]
    Unhealthy,

    #[error("inference request timed out")]
    Timeout,

    #[error("gRPC transport error: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("gRPC connect error: {0}")]
    GrpcConnect(#[from] tonic::transport::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("adapter returned malformed response: {0}")]
    MalformedResponse(String),
}
