//! `AlertDispatcher` collaborator port: the Telegram collaborator. Wire
//! format is unspecified — the core only calls `send_alert`.

use async_trait::async_trait;
use bytes::Bytes;
use sentry_models::{MotionEvent, ThreatLevel};
use tokio::sync::Mutex;

use crate::error::EventsResult;

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Sends a single alert. `image` is the best available frame (annotated
    /// if present, else the last raw frame).
    async fn send_alert(&self, event: &MotionEvent, image: Option<Bytes>, threat_level: ThreatLevel) -> EventsResult<()>;
}

/// In-memory dispatcher for tests and local runs: records every call it
/// receives instead of placing a network call.
#[derive(Default)]
pub struct InMemoryAlertDispatcher {
    sent: Mutex<Vec<(uuid::Uuid, ThreatLevel)>>,
}

impl InMemoryAlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(uuid::Uuid, ThreatLevel)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl AlertDispatcher for InMemoryAlertDispatcher {
    async fn send_alert(&self, event: &MotionEvent, _image: Option<Bytes>, threat_level: ThreatLevel) -> EventsResult<()> {
        self.sent.lock().await.push((event.id, threat_level));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentry_models::CameraId;

    #[tokio::test]
    async fn records_every_send() {
        let dispatcher = InMemoryAlertDispatcher::new();
        let event = MotionEvent::new(CameraId::new(), "frame.jpg");
        dispatcher.send_alert(&event, None, ThreatLevel::High).await.unwrap();
        assert_eq!(dispatcher.sent().await.len(), 1);
    }
}
