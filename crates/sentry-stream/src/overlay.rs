//! Stream Overlay Provider (C7, §4.7): holds, per camera, the latest
//! annotated JPEG and its sequence number.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sentry_models::{CameraId, FaceDetection, ObjectDetection};
use tokio::sync::{watch, RwLock};

/// One stored frame plus its monotonic sequence (§9 open question:
/// `AnnotatedFrame` carries `seq` so staleness can be rejected at write time).
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub seq: u64,
    pub jpeg: Bytes,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectionMeta {
    pub objects: Vec<ObjectDetection>,
    pub faces: Vec<FaceDetection>,
}

struct CameraSlot {
    frame_tx: watch::Sender<Option<AnnotatedFrame>>,
    detections: RwLock<DetectionMeta>,
    dimensions: RwLock<(u32, u32)>,
}

/// Process-wide singleton. Fans out to the MJPEG pull handler, the
/// WebSocket push handler, and the snapshot endpoint, all subscribing to the
/// same per-camera `watch::Receiver`.
#[derive(Default)]
pub struct StreamProvider {
    slots: RwLock<HashMap<CameraId, Arc<CameraSlot>>>,
}

impl StreamProvider {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot_for(&self, camera_id: CameraId) -> Arc<CameraSlot> {
        if let Some(slot) = self.slots.read().await.get(&camera_id) {
            return slot.clone();
        }
        let mut slots = self.slots.write().await;
        slots
            .entry(camera_id)
            .or_insert_with(|| {
                Arc::new(CameraSlot {
                    frame_tx: watch::channel(None).0,
                    detections: RwLock::new(DetectionMeta::default()),
                    dimensions: RwLock::new((0, 0)),
                })
            })
            .clone()
    }

    /// `SetAnnotatedFrame(camera_id, seq, jpeg)`: stores the frame iff
    /// `seq > last_seq_for_camera`, otherwise discards — the monotonic
    /// freshness guarantee (§4.7, §8 invariant).
    pub async fn set_annotated_frame(&self, camera_id: CameraId, seq: u64, jpeg: Bytes) {
        let slot = self.slot_for(camera_id).await;
        let is_newer = match slot.frame_tx.borrow().as_ref() {
            Some(current) => seq > current.seq,
            None => true,
        };
        if is_newer {
            let _ = slot.frame_tx.send(Some(AnnotatedFrame {
                seq,
                jpeg,
                captured_at: Utc::now(),
            }));
        }
    }

    /// `UpdateDetections(camera_id, objects, faces)`: stores metadata for
    /// client-side rendering.
    pub async fn update_detections(&self, camera_id: CameraId, objects: Vec<ObjectDetection>, faces: Vec<FaceDetection>) {
        let slot = self.slot_for(camera_id).await;
        *slot.detections.write().await = DetectionMeta { objects, faces };
    }

    /// `GetCurrentFrameSeq(camera_id)`.
    pub async fn get_current_frame_seq(&self, camera_id: CameraId) -> Option<u64> {
        let slots = self.slots.read().await;
        slots.get(&camera_id)?.frame_tx.borrow().as_ref().map(|f| f.seq)
    }

    pub async fn latest_frame(&self, camera_id: CameraId) -> Option<AnnotatedFrame> {
        let slots = self.slots.read().await;
        slots.get(&camera_id)?.frame_tx.borrow().clone()
    }

    pub async fn detections(&self, camera_id: CameraId) -> Option<DetectionMeta> {
        let slots = self.slots.read().await;
        let slot = slots.get(&camera_id)?;
        Some(slot.detections.read().await.clone())
    }

    /// Records the camera's frame resolution, carried on every
    /// `/ws/detections` message (§6). Set once at `Activate` time from the
    /// camera record, not inferred from the JPEG bytes.
    pub async fn set_dimensions(&self, camera_id: CameraId, width: u32, height: u32) {
        let slot = self.slot_for(camera_id).await;
        *slot.dimensions.write().await = (width, height);
    }

    pub async fn dimensions(&self, camera_id: CameraId) -> (u32, u32) {
        let slots = self.slots.read().await;
        match slots.get(&camera_id) {
            Some(slot) => *slot.dimensions.read().await,
            None => (0, 0),
        }
    }

    /// Subscribed by both the MJPEG pull handler (blocks on `changed()`
    /// instead of a condition variable) and the WebSocket push handler.
    pub async fn subscribe(&self, camera_id: CameraId) -> watch::Receiver<Option<AnnotatedFrame>> {
        self.slot_for(camera_id).await.frame_tx.subscribe()
    }

    /// `DeleteStream(camera_id)`: drops the slot entirely.
    pub async fn delete_stream(&self, camera_id: CameraId) {
        self.slots.write().await.remove(&camera_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_seq_is_discarded() {
        let provider = StreamProvider::new();
        let camera_id = CameraId::new();

        provider.set_annotated_frame(camera_id, 5, Bytes::from_static(b"newer")).await;
        provider.set_annotated_frame(camera_id, 3, Bytes::from_static(b"older")).await;

        let frame = provider.latest_frame(camera_id).await.unwrap();
        assert_eq!(frame.seq, 5);
        assert_eq!(frame.jpeg, Bytes::from_static(b"newer"));
    }

    #[tokio::test]
    async fn monotonic_seq_updates() {
        let provider = StreamProvider::new();
        let camera_id = CameraId::new();

        for seq in 1..=5 {
            provider.set_annotated_frame(camera_id, seq, Bytes::from(vec![seq as u8])).await;
        }

        assert_eq!(provider.get_current_frame_seq(camera_id).await, Some(5));
    }

    #[tokio::test]
    async fn delete_stream_clears_slot() {
        let provider = StreamProvider::new();
        let camera_id = CameraId::new();
        provider.set_annotated_frame(camera_id, 1, Bytes::from_static(b"x")).await;
        provider.delete_stream(camera_id).await;
        assert!(provider.latest_frame(camera_id).await.is_none());
    }
}
