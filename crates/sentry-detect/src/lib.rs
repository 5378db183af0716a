//! Detector registry and adapters (C3) plus detection strategy (C4).

pub mod pb {
    tonic::include_proto!("sentry.detect.v1");
}

pub mod error;
pub mod face_http;
pub mod grpc_face;
pub mod grpc_yolo;
pub mod health;
pub mod http;
pub mod object_http;
pub mod registry;
pub mod strategy;
pub mod traits;

pub use error::{DetectError, DetectResult};
pub use face_http::HttpFaceAdapter;
pub use grpc_face::GrpcFaceAdapter;
pub use grpc_yolo::GrpcYoloAdapter;
pub use health::HealthCache;
pub use http::HttpAdapterConfig;
pub use object_http::HttpObjectAdapter;
pub use registry::DetectorRegistry;
pub use strategy::{
    DetectionStrategy, Disabled, Hybrid, MotionDetector, MotionTriggered, RateLimited, Scheduled,
    DEFAULT_MOTION_COOLDOWN_MS, DEFAULT_MOTION_SENSITIVITY, DEFAULT_SCHEDULE_INTERVAL_SECS,
};
pub use traits::{default_should_run, ConditionalRunner, DetectorAdapter, DetectorType};
