//! Camera identifier.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CameraId(pub Uuid);

impl CameraId {
    /// Generate a new random camera id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for CameraId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CameraId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_ids() {
        assert_ne!(CameraId::new(), CameraId::new());
    }

    #[test]
    fn display_matches_uuid() {
        let id = CameraId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }
}
