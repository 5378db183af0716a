//! API error types: aggregates every crate's error enum behind one
//! `IntoResponse` surface, matching `vclip_api::error::ApiError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("capture error: {0}")]
    Capture(#[from] sentry_capture::CaptureError),

    #[error("detect error: {0}")]
    Detect(#[from] sentry_detect::DetectError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] sentry_pipeline::PipelineError),

    #[error("stream error: {0}")]
    Stream(#[from] sentry_stream::StreamError),

    #[error("events error: {0}")]
    Events(#[from] sentry_events::EventsError),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] sentry_orchestrator::OrchestratorError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Capture(e) => match e {
                sentry_capture::CaptureError::NotFound => StatusCode::NOT_FOUND,
                sentry_capture::CaptureError::AlreadyRunning => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Detect(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(e) => match e {
                sentry_pipeline::PipelineError::NotFound => StatusCode::NOT_FOUND,
                sentry_pipeline::PipelineError::AlreadyRunning => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Stream(e) => match e {
                sentry_stream::StreamError::NotFound => StatusCode::NOT_FOUND,
                sentry_stream::StreamError::AlreadyRunning => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Events(e) => match e {
                sentry_events::EventsError::CameraNotFound(_) | sentry_events::EventsError::EventNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Orchestrator(e) => match e {
                sentry_orchestrator::OrchestratorError::AlreadyActive => StatusCode::CONFLICT,
                sentry_orchestrator::OrchestratorError::NotActive => StatusCode::CONFLICT,
                sentry_orchestrator::OrchestratorError::DeviceChangeWhileActive => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if self.is_internal() && std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
