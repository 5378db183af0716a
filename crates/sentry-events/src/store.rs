//! `EventStore` collaborator port: the storage collaborator that persists
//! motion events and camera records. SQLite schema is unspecified — this
//! core only talks to the port, mirroring how `vclip-storage::R2Client` is
//! the only thing `vclip-media` ever imports.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sentry_models::{CameraId, CameraRecord, CameraStatus, MotionEvent};
use uuid::Uuid;

use crate::error::{EventsError, EventsResult};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn save_event(&self, event: MotionEvent) -> EventsResult<()>;

    /// Flips `notification_sent` to true for a previously saved event.
    async fn mark_notified(&self, event_id: Uuid) -> EventsResult<()>;

    async fn load_camera(&self, camera_id: CameraId) -> EventsResult<CameraRecord>;

    /// Inserts or replaces a camera record (admin CRUD surface, §6).
    async fn save_camera(&self, camera: CameraRecord) -> EventsResult<()>;

    async fn list_cameras(&self) -> EventsResult<Vec<CameraRecord>>;

    async fn delete_camera(&self, camera_id: CameraId) -> EventsResult<()>;

    /// Updates just the lifecycle status (§4.9 Activate/Deactivate).
    async fn set_camera_status(&self, camera_id: CameraId, status: CameraStatus) -> EventsResult<()>;
}

/// In-memory `EventStore` for tests and local runs without a configured
/// database collaborator.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<Uuid, MotionEvent>>,
    cameras: RwLock<HashMap<CameraId, CameraRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(self, camera: CameraRecord) -> Self {
        self.cameras.write().unwrap().insert(camera.id, camera);
        self
    }

    pub fn events(&self) -> Vec<MotionEvent> {
        self.events.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn save_event(&self, event: MotionEvent) -> EventsResult<()> {
        self.events.write().unwrap().insert(event.id, event);
        Ok(())
    }

    async fn mark_notified(&self, event_id: Uuid) -> EventsResult<()> {
        let mut events = self.events.write().unwrap();
        let event = events
            .get_mut(&event_id)
            .ok_or_else(|| EventsError::EventNotFound(event_id.to_string()))?;
        event.notification_sent = true;
        Ok(())
    }

    async fn load_camera(&self, camera_id: CameraId) -> EventsResult<CameraRecord> {
        self.cameras
            .read()
            .unwrap()
            .get(&camera_id)
            .cloned()
            .ok_or_else(|| EventsError::CameraNotFound(camera_id.to_string()))
    }

    async fn save_camera(&self, camera: CameraRecord) -> EventsResult<()> {
        self.cameras.write().unwrap().insert(camera.id, camera);
        Ok(())
    }

    async fn list_cameras(&self) -> EventsResult<Vec<CameraRecord>> {
        Ok(self.cameras.read().unwrap().values().cloned().collect())
    }

    async fn delete_camera(&self, camera_id: CameraId) -> EventsResult<()> {
        self.cameras.write().unwrap().remove(&camera_id);
        Ok(())
    }

    async fn set_camera_status(&self, camera_id: CameraId, status: CameraStatus) -> EventsResult<()> {
        let mut cameras = self.cameras.write().unwrap();
        let camera = cameras
            .get_mut(&camera_id)
            .ok_or_else(|| EventsError::CameraNotFound(camera_id.to_string()))?;
        camera.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentry_models::CameraRecord;

    #[tokio::test]
    async fn save_then_mark_notified() {
        let store = InMemoryEventStore::new();
        let camera_id = CameraId::new();
        let event = MotionEvent::new(camera_id, "frame.jpg");
        let id = event.id;
        store.save_event(event).await.unwrap();
        store.mark_notified(id).await.unwrap();
        assert!(store.events()[0].notification_sent);
    }

    #[tokio::test]
    async fn mark_notified_missing_event_errors() {
        let store = InMemoryEventStore::new();
        assert!(store.mark_notified(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn load_unknown_camera_errors() {
        let store = InMemoryEventStore::new();
        assert!(store.load_camera(CameraId::new()).await.is_err());
    }

    #[tokio::test]
    async fn load_known_camera_succeeds() {
        let camera = CameraRecord::new("front door", "/dev/video0", 640, 480, 10);
        let camera_id = camera.id;
        let store = InMemoryEventStore::new().with_camera(camera);
        let loaded = store.load_camera(camera_id).await.unwrap();
        assert_eq!(loaded.id, camera_id);
    }

    #[tokio::test]
    async fn set_camera_status_updates_record() {
        let camera = CameraRecord::new("front door", "/dev/video0", 640, 480, 10);
        let camera_id = camera.id;
        let store = InMemoryEventStore::new().with_camera(camera);
        store.set_camera_status(camera_id, sentry_models::CameraStatus::Active).await.unwrap();
        assert_eq!(store.load_camera(camera_id).await.unwrap().status, sentry_models::CameraStatus::Active);
    }

    #[tokio::test]
    async fn list_cameras_returns_saved_records() {
        let store = InMemoryEventStore::new();
        let camera = CameraRecord::new("front door", "/dev/video0", 640, 480, 10);
        store.save_camera(camera.clone()).await.unwrap();
        let cameras = store.list_cameras().await.unwrap();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0].id, camera.id);
    }
}
