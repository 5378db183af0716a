//! Camera record (§3).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::CameraId;

/// Lifecycle status of a camera record.
///
/// Always starts `inactive`; the orchestrator (C9) flips it to `active` on
/// successful `Activate` and back on `Deactivate` or capture failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    #[default]
    Inactive,
    Active,
    Error,
}

impl CameraStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraStatus::Inactive => "inactive",
            CameraStatus::Active => "active",
            CameraStatus::Error => "error",
        }
    }
}

/// A camera as persisted by the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CameraRecord {
    pub id: CameraId,
    pub name: String,
    /// V4L2 path, `http(s)://…`, or `rtsp://…` (see §6 device strings).
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub status: CameraStatus,
    pub created_at: DateTime<Utc>,
    pub events_enabled: bool,
    pub notifications_enabled: bool,
}

impl CameraRecord {
    pub fn new(name: impl Into<String>, device: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            id: CameraId::new(),
            name: name.into(),
            device: device.into(),
            width,
            height,
            fps,
            status: CameraStatus::Inactive,
            created_at: Utc::now(),
            events_enabled: true,
            notifications_enabled: true,
        }
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_camera_starts_inactive() {
        let cam = CameraRecord::new("front door", "/dev/video0", 640, 480, 10);
        assert_eq!(cam.status, CameraStatus::Inactive);
        assert_eq!(cam.resolution(), "640x480");
    }
}
