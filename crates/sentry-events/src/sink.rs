//! Event sink (§4.8): persists motion events and dispatches alerts for
//! published detection results.

use std::sync::Arc;
use std::time::Duration;

use sentry_models::{CameraId, MergedDetectionResult, MotionEvent};
use tracing::{error, info, warn};

use crate::cooldown::CooldownCache;
use crate::dispatcher::AlertDispatcher;
use crate::store::EventStore;
use crate::thumbnail::ThumbnailWriter;

/// Deadline for the fire-and-forget alert call (§4.8).
const ALERT_DEADLINE: Duration = Duration::from_secs(30);

pub struct EventSink<S, A> {
    store: Arc<S>,
    dispatcher: Arc<A>,
    thumbnails: Arc<ThumbnailWriter>,
    cooldown: Arc<CooldownCache>,
}

impl<S, A> Clone for EventSink<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            thumbnails: self.thumbnails.clone(),
            cooldown: self.cooldown.clone(),
        }
    }
}

impl<S, A> EventSink<S, A>
where
    S: EventStore + 'static,
    A: AlertDispatcher + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<A>, thumbnails: Arc<ThumbnailWriter>, cooldown: Arc<CooldownCache>) -> Self {
        Self { store, dispatcher, thumbnails, cooldown }
    }

    /// Entry point for a single published `MergedDetectionResult` (§4.8).
    /// Suppresses both persistence and alerting when the pipeline marked
    /// the publication `events_suppressed` (visual_only/disabled).
    pub async fn handle(&self, result: &MergedDetectionResult) {
        if result.events_suppressed {
            return;
        }

        let camera = match self.store.load_camera(result.camera_id).await {
            Ok(camera) => camera,
            Err(e) => {
                warn!(camera_id = %result.camera_id, error = %e, "event sink: unknown camera, dropping publication");
                return;
            }
        };

        if !camera.events_enabled {
            return;
        }

        let event = match self.persist(result).await {
            Some(event) => event,
            None => return,
        };

        if camera.notifications_enabled && !event.notification_sent {
            self.dispatch_alert(event, result).await;
        }
    }

    async fn persist(&self, result: &MergedDetectionResult) -> Option<MotionEvent> {
        let timestamp_ns = result.timestamp.timestamp_nanos_opt().unwrap_or_default();

        let frame_path = match &result.annotated_jpeg {
            Some(jpeg) => self.thumbnails.write_frame(result.camera_id, timestamp_ns, jpeg).await.unwrap_or_default(),
            None => String::new(),
        };

        let has_person = result.objects.iter().any(|o| o.class_label == "person");
        let mut forensic_paths = Vec::new();
        if has_person && !result.faces.is_empty() {
            for (index, face) in result.faces.iter().enumerate() {
                if let Some(crop) = &face.crop_base64 {
                    if let Some(path) = self.thumbnails.write_forensic_thumbnail(result.camera_id, timestamp_ns, index, crop).await {
                        forensic_paths.push(path);
                    }
                }
            }
        }

        let mut event = MotionEvent::new(result.camera_id, frame_path);
        event.timestamp = result.timestamp;
        event.confidence = result.objects.iter().map(|o| o.confidence).fold(0.0_f32, f32::max);
        event.bounding_boxes = result.objects.iter().map(|o| o.bbox).collect();
        event.object_class = result.objects.first().map(|o| o.class_label.clone());
        event.object_confidence = result.objects.first().map(|o| o.confidence);
        event.threat_level = result.threat_level();
        event.inference_ms = result.total_inference_ms;
        event.faces_detected = result.faces.len() as u32;
        event.known_identities = result.faces.iter().filter_map(|f| f.identity_name.clone()).collect();
        event.unknown_face_count = result.faces.iter().filter(|f| !f.is_known).count() as u32;
        event.forensic_thumbnail_paths = forensic_paths;

        if let Err(e) = self.store.save_event(event.clone()).await {
            error!(camera_id = %result.camera_id, error = %e, "failed to persist motion event");
            return None;
        }
        Some(event)
    }

    async fn dispatch_alert(&self, event: MotionEvent, result: &MergedDetectionResult) {
        let camera_id = event.camera_id;
        let threat_level = event.threat_level;
        let image = result.annotated_jpeg.clone().or_else(|| result.raw_jpeg.clone());

        if !self.cooldown.may_send(camera_id) {
            info!(%camera_id, "alert suppressed by cooldown");
            return;
        }

        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();
        let cooldown = self.cooldown.clone();

        tokio::spawn(async move {
            let send = dispatcher.send_alert(&event, image, threat_level);
            match tokio::time::timeout(ALERT_DEADLINE, send).await {
                Ok(Ok(())) => {
                    cooldown.record_sent(camera_id);
                    if let Err(e) = store.mark_notified(event.id).await {
                        error!(event_id = %event.id, error = %e, "failed to persist notification_sent");
                    }
                }
                Ok(Err(e)) => {
                    warn!(event_id = %event.id, error = %e, "alert dispatch failed; notification_sent stays false");
                }
                Err(_) => {
                    warn!(event_id = %event.id, "alert dispatch timed out after 30s");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::CooldownCache;
    use crate::dispatcher::InMemoryAlertDispatcher;
    use crate::store::InMemoryEventStore;
    use bytes::Bytes;
    use chrono::Utc;
    use sentry_models::{BoundingBox, CameraRecord, ObjectDetection};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn merged(camera_id: CameraId, suppressed: bool) -> MergedDetectionResult {
        MergedDetectionResult {
            camera_id,
            frame_seq: 1,
            timestamp: Utc::now(),
            objects: vec![ObjectDetection {
                class_label: "person".into(),
                confidence: 0.9,
                bbox: BoundingBox::new(0, 0, 10, 10),
                track_id: None,
                category: None,
            }],
            faces: vec![],
            annotated_jpeg: Some(Bytes::from_static(b"jpeg")),
            raw_jpeg: Some(Bytes::from_static(b"raw")),
            total_inference_ms: 20,
            has_motion: true,
            events_suppressed: suppressed,
        }
    }

    fn sink(camera: CameraRecord) -> (EventSink<InMemoryEventStore, InMemoryAlertDispatcher>, Arc<InMemoryEventStore>, Arc<InMemoryAlertDispatcher>) {
        let store = Arc::new(InMemoryEventStore::new().with_camera(camera));
        let dispatcher = Arc::new(InMemoryAlertDispatcher::new());
        let dir = tempfile::tempdir().unwrap();
        let thumbnails = Arc::new(ThumbnailWriter::new(dir.path().to_path_buf()));
        let cooldown = Arc::new(CooldownCache::new(Duration::from_secs(30)));
        (EventSink::new(store.clone(), dispatcher.clone(), thumbnails, cooldown), store, dispatcher)
    }

    #[tokio::test]
    async fn suppressed_publication_is_ignored() {
        let camera = CameraRecord::new("cam", "/dev/video0", 640, 480, 10);
        let camera_id = camera.id;
        let (sink, store, _dispatcher) = sink(camera);
        sink.handle(&merged(camera_id, true)).await;
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn unsuppressed_publication_persists_event() {
        let camera = CameraRecord::new("cam", "/dev/video0", 640, 480, 10);
        let camera_id = camera.id;
        let (sink, store, _dispatcher) = sink(camera);
        sink.handle(&merged(camera_id, false)).await;
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events()[0].threat_level, sentry_models::ThreatLevel::High);
    }

    #[tokio::test]
    async fn events_disabled_camera_skips_persistence() {
        let mut camera = CameraRecord::new("cam", "/dev/video0", 640, 480, 10);
        camera.events_enabled = false;
        let camera_id = camera.id;
        let (sink, store, _dispatcher) = sink(camera);
        sink.handle(&merged(camera_id, false)).await;
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_camera_is_dropped_without_panic() {
        let camera = CameraRecord::new("cam", "/dev/video0", 640, 480, 10);
        let (sink, store, _dispatcher) = sink(camera);
        sink.handle(&merged(CameraId::new(), false)).await;
        assert!(store.events().is_empty());
    }

    #[derive(Default)]
    struct ImageCapturingDispatcher {
        images: Mutex<Vec<Option<Bytes>>>,
    }

    #[async_trait::async_trait]
    impl crate::dispatcher::AlertDispatcher for ImageCapturingDispatcher {
        async fn send_alert(&self, _event: &MotionEvent, image: Option<Bytes>, _threat_level: sentry_models::ThreatLevel) -> crate::error::EventsResult<()> {
            self.images.lock().await.push(image);
            Ok(())
        }
    }

    #[tokio::test]
    async fn alert_falls_back_to_raw_frame_when_unannotated() {
        let camera = CameraRecord::new("cam", "/dev/video0", 640, 480, 10);
        let camera_id = camera.id;
        let store = Arc::new(InMemoryEventStore::new().with_camera(camera));
        let dispatcher = Arc::new(ImageCapturingDispatcher::default());
        let dir = tempfile::tempdir().unwrap();
        let thumbnails = Arc::new(ThumbnailWriter::new(dir.path().to_path_buf()));
        let cooldown = Arc::new(CooldownCache::new(Duration::from_secs(30)));
        let sink = EventSink::new(store, dispatcher.clone(), thumbnails, cooldown);

        let mut result = merged(camera_id, false);
        result.annotated_jpeg = None;
        sink.handle(&result).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let images = dispatcher.images.lock().await;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0], Some(Bytes::from_static(b"raw")));
    }
}
