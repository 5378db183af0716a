//! Motion event (§3).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::{BoundingBox, ThreatLevel};
use crate::ids::CameraId;

/// A persisted motion/detection event.
///
/// Created only when the effective mode is not `visual_only` and the
/// camera's events-enabled flag is true (§3, §7 invariant 7).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MotionEvent {
    pub id: Uuid,
    pub camera_id: CameraId,
    pub timestamp: DateTime<Utc>,
    pub confidence: f32,
    pub bounding_boxes: Vec<BoundingBox>,
    /// Path of the saved annotated frame on disk.
    pub frame_path: String,
    pub notification_sent: bool,

    // AI-enhanced fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_confidence: Option<f32>,
    pub threat_level: ThreatLevel,
    pub inference_ms: u64,
    pub detection_device: String,

    // Face-recognition fields.
    pub faces_detected: u32,
    pub known_identities: Vec<String>,
    pub unknown_face_count: u32,
    pub forensic_thumbnail_paths: Vec<String>,
}

impl MotionEvent {
    pub fn new(camera_id: CameraId, frame_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            camera_id,
            timestamp: Utc::now(),
            confidence: 0.0,
            bounding_boxes: Vec::new(),
            frame_path: frame_path.into(),
            notification_sent: false,
            object_class: None,
            object_confidence: None,
            threat_level: ThreatLevel::None,
            inference_ms: 0,
            detection_device: String::new(),
            faces_detected: 0,
            known_identities: Vec::new(),
            unknown_face_count: 0,
            forensic_thumbnail_paths: Vec::new(),
        }
    }
}
