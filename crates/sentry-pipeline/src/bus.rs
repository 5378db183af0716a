//! Event Bus (C6, §4.6): fans merged detection results out to subscribers.

use std::sync::Arc;

use sentry_models::{CameraId, MergedDetectionResult};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Default channel-subscription buffer (§4.6).
pub const DEFAULT_CHANNEL_BUFFER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusSubscriptionId(pub Uuid);

impl BusSubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Synchronous callback, invoked in publish order — downstream consumers
/// must not reorder, so this must never spawn a detached task internally.
pub type Handler = Arc<dyn Fn(&MergedDetectionResult) + Send + Sync>;

enum Subscriber {
    Handler { camera_filter: Option<CameraId>, handler: Handler },
    Channel { camera_filter: Option<CameraId>, tx: mpsc::Sender<MergedDetectionResult> },
}

/// Process-wide singleton (one per process, shared by every pipeline
/// instance). `Publish` walks subscriptions under a read lock, mirroring
/// C2's fan-out.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<std::collections::HashMap<BusSubscriptionId, Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe_handler(&self, camera_filter: Option<CameraId>, handler: Handler) -> BusSubscriptionId {
        let id = BusSubscriptionId::new();
        self.subscribers
            .write()
            .await
            .insert(id, Subscriber::Handler { camera_filter, handler });
        id
    }

    /// Returns a receiver; the sender drops full messages rather than block
    /// the publisher (§4.6 "bounded channel, drop-on-full").
    pub async fn subscribe_channel(
        &self,
        camera_filter: Option<CameraId>,
        buffer: usize,
    ) -> (BusSubscriptionId, mpsc::Receiver<MergedDetectionResult>) {
        let id = BusSubscriptionId::new();
        let (tx, rx) = mpsc::channel(buffer.max(1));
        self.subscribers
            .write()
            .await
            .insert(id, Subscriber::Channel { camera_filter, tx });
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: BusSubscriptionId) {
        self.subscribers.write().await.remove(&id);
    }

    pub async fn publish(&self, result: &MergedDetectionResult) {
        let subscribers = self.subscribers.read().await;
        for subscriber in subscribers.values() {
            match subscriber {
                Subscriber::Handler { camera_filter, handler } => {
                    if matches_filter(camera_filter, result.camera_id) {
                        handler(result);
                    }
                }
                Subscriber::Channel { camera_filter, tx } => {
                    if matches_filter(camera_filter, result.camera_id) {
                        let _ = tx.try_send(result.clone());
                    }
                }
            }
        }
    }

    pub async fn close(&self) {
        self.subscribers.write().await.clear();
    }
}

fn matches_filter(filter: &Option<CameraId>, camera_id: CameraId) -> bool {
    match filter {
        Some(expected) => *expected == camera_id,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(camera_id: CameraId, seq: u64) -> MergedDetectionResult {
        MergedDetectionResult {
            camera_id,
            frame_seq: seq,
            timestamp: Utc::now(),
            objects: vec![],
            faces: vec![],
            annotated_jpeg: None,
            raw_jpeg: None,
            total_inference_ms: 0,
            has_motion: false,
            events_suppressed: false,
        }
    }

    #[tokio::test]
    async fn handler_delivery_is_synchronous_and_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.subscribe_handler(
            None,
            Arc::new(move |r: &MergedDetectionResult| seen_clone.lock().unwrap().push(r.frame_seq)),
        )
        .await;

        let camera_id = CameraId::new();
        bus.publish(&result(camera_id, 1)).await;
        bus.publish(&result(camera_id, 2)).await;
        bus.publish(&result(camera_id, 3)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn camera_filter_excludes_other_cameras() {
        let bus = EventBus::new();
        let camera_a = CameraId::new();
        let camera_b = CameraId::new();
        let (_id, mut rx) = bus.subscribe_channel(Some(camera_a), 5).await;

        bus.publish(&result(camera_b, 1)).await;
        bus.publish(&result(camera_a, 2)).await;

        let received = rx.try_recv().unwrap();
        assert_eq!(received.camera_id, camera_a);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_channel_drops_without_blocking() {
        let bus = EventBus::new();
        let camera_id = CameraId::new();
        let (_id, mut rx) = bus.subscribe_channel(None, 1).await;

        bus.publish(&result(camera_id, 1)).await;
        bus.publish(&result(camera_id, 2)).await; // dropped, queue full

        let first = rx.try_recv().unwrap();
        assert_eq!(first.frame_seq, 1);
        assert!(rx.try_recv().is_err());
    }
}
