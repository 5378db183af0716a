//! Shared data models for the sentrymesh camera pipeline.
//!
//! This crate provides serde-serializable types shared across the capture,
//! detection, pipeline, streaming, events and orchestrator crates:
//! - Frames and subscriptions (C1/C2)
//! - Detection results, bounding boxes, threat levels (C3/C4/C5)
//! - Effective per-camera pipeline configuration
//! - Camera records and motion events (persisted by the storage collaborator)

pub mod camera;
pub mod config;
pub mod detection;
pub mod event;
pub mod frame;
pub mod ids;

pub use camera::{CameraRecord, CameraStatus};
pub use config::{EffectivePipelineConfig, ExecutionMode, PipelineMode};
pub use detection::{
    BoundingBox, DetectionResult, FaceDetection, MergedDetectionResult, ObjectDetection,
    ThreatLevel,
};
pub use event::MotionEvent;
pub use frame::{Frame, Subscription, SubscriptionId};
pub use ids::CameraId;
