//! Detection result models (§3: Bounding box, Object/Face detection,
//! Detection result, Merged detection result).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::CameraId;

/// Integer pixel-space bounding box in the source frame.
///
/// Wire conversion to `[x, y, w, h]` vs `[x1, y1, x2, y2]` is the
/// responsibility of whichever boundary talks to an external adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }
}

/// Derived threat category, computed by policy from an object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl ThreatLevel {
    /// `person -> high`, `{car, truck, bus} -> medium`, otherwise `low`.
    pub fn for_class(class_label: &str) -> Self {
        match class_label {
            "person" => ThreatLevel::High,
            "car" | "truck" | "bus" => ThreatLevel::Medium,
            _ => ThreatLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::High => "high",
            ThreatLevel::Medium => "medium",
            ThreatLevel::Low => "low",
            ThreatLevel::None => "none",
        }
    }

    /// Emoji used by the alert dispatcher (§4.8).
    pub fn emoji(&self) -> &'static str {
        match self {
            ThreatLevel::High => "🔴",
            ThreatLevel::Medium => "🟠",
            ThreatLevel::Low => "🟡",
            ThreatLevel::None => "⚪",
        }
    }
}

/// One object detection from the primary detector stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectDetection {
    pub class_label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ObjectDetection {
    pub fn threat_level(&self) -> ThreatLevel {
        ThreatLevel::for_class(&self.class_label)
    }
}

/// One face detection, optionally associated with a containing person
/// detection by track id or containment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    pub is_known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_track_id: Option<u64>,
    /// Base64-encoded JPEG crop of this face, when the recognition adapter
    /// attaches one. Consumed by the event sink's forensic thumbnail path
    /// (§4.8); never sent over the wire to viewers.
    #[serde(skip)]
    pub crop_base64: Option<String>,
}

/// Output of a single detector stage for one `(camera_id, frame_seq)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionResult {
    pub camera_id: CameraId,
    pub frame_seq: u64,
    pub timestamp: DateTime<Utc>,
    /// Name of the detector that produced this result (e.g. "yolo", "face").
    pub detector_tag: String,
    pub objects: Vec<ObjectDetection>,
    pub faces: Vec<FaceDetection>,
    /// Only populated when this stage produced a rendered image.
    #[serde(skip)]
    pub annotated_jpeg: Option<bytes::Bytes>,
    pub inference_ms: u64,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.faces.is_empty()
    }
}

/// Union of one or more single-stage results for the same
/// `(camera_id, frame_seq)`.
///
/// Never constructed across differing `(camera_id, frame_seq)` — the
/// pipeline enforces this at merge time (see `sentry-pipeline`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MergedDetectionResult {
    pub camera_id: CameraId,
    pub frame_seq: u64,
    pub timestamp: DateTime<Utc>,
    pub objects: Vec<ObjectDetection>,
    pub faces: Vec<FaceDetection>,
    /// The latest chained stage's image, chosen per the image-promotion
    /// rule in §4.5.
    #[serde(skip)]
    pub annotated_jpeg: Option<bytes::Bytes>,
    /// The frame handed to the chain before any stage ran, kept for the
    /// alert fallback in §4.8 ("annotated if present, else the last raw
    /// frame").
    #[serde(skip)]
    pub raw_jpeg: Option<bytes::Bytes>,
    pub total_inference_ms: u64,
    pub has_motion: bool,
    /// Set by the pipeline when the camera's effective mode is `visual_only`
    /// or `disabled` (§4.4, §4.8): the event sink still receives the
    /// publication (so the stream overlay keeps working) but must not
    /// persist or alert on it.
    pub events_suppressed: bool,
}

impl MergedDetectionResult {
    /// Highest threat level among all object detections, or `None` if there
    /// are none.
    pub fn threat_level(&self) -> ThreatLevel {
        self.objects
            .iter()
            .map(|o| o.threat_level())
            .max_by_key(|t| match t {
                ThreatLevel::High => 3,
                ThreatLevel::Medium => 2,
                ThreatLevel::Low => 1,
                ThreatLevel::None => 0,
            })
            .unwrap_or(ThreatLevel::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_policy() {
        assert_eq!(ThreatLevel::for_class("person"), ThreatLevel::High);
        assert_eq!(ThreatLevel::for_class("car"), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::for_class("truck"), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::for_class("bus"), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::for_class("dog"), ThreatLevel::Low);
    }

    #[test]
    fn merged_threat_level_picks_max() {
        let merged = MergedDetectionResult {
            camera_id: CameraId::new(),
            frame_seq: 1,
            timestamp: Utc::now(),
            objects: vec![
                ObjectDetection {
                    class_label: "dog".into(),
                    confidence: 0.9,
                    bbox: BoundingBox::new(0, 0, 10, 10),
                    track_id: None,
                    category: None,
                },
                ObjectDetection {
                    class_label: "person".into(),
                    confidence: 0.95,
                    bbox: BoundingBox::new(0, 0, 10, 10),
                    track_id: None,
                    category: None,
                },
            ],
            faces: vec![],
            annotated_jpeg: None,
            total_inference_ms: 10,
            has_motion: true,
            events_suppressed: false,
        };
        assert_eq!(merged.threat_level(), ThreatLevel::High);
    }
}
