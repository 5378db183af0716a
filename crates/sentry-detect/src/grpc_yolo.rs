//! gRPC bidirectional-streaming YOLO adapter (§4.3, §6 "Inference wire").
//!
//! Opens one bidirectional stream on first use: a background writer
//! forwards requests, a background reader publishes responses on an
//! internal channel, correlated to the waiting caller by
//! `(camera_id, frame_seq)` since several cameras can share one adapter
//! instance (the stream is process-global, not per camera — §5 task
//! inventory). The annotated path instead opens a fresh one-shot stream per
//! call, trading latency for guaranteed response routing, exactly as
//! described in §4.3.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sentry_models::{BoundingBox, CameraId, DetectionResult, ObjectDetection};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tracing::warn;

use crate::error::{DetectError, DetectResult};
use crate::health::HealthCache;
use crate::traits::{DetectorAdapter, DetectorType};

use crate::pb;
use pb::detector_client::DetectorClient;

const SEND_TIMEOUT: Duration = Duration::from_millis(100);
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

type WaiterKey = (CameraId, u64);
type WaiterMap = Arc<Mutex<HashMap<WaiterKey, oneshot::Sender<pb::DetectResponse>>>>;

struct StandingStream {
    req_tx: mpsc::Sender<pb::DetectRequest>,
    waiters: WaiterMap,
}

pub struct GrpcYoloAdapter {
    tag: String,
    client: DetectorClient<Channel>,
    stream: Mutex<Option<StandingStream>>,
    health: HealthCache,
}

impl GrpcYoloAdapter {
    pub fn new(tag: impl Into<String>, endpoint: impl Into<String>) -> DetectResult<Self> {
        let channel = Channel::from_shared(endpoint.into())
            .map_err(|e| DetectError::GrpcConnect(tonic::transport::Error::from(e)))?
            .connect_lazy();
        Ok(Self {
            tag: tag.into(),
            client: DetectorClient::new(channel),
            stream: Mutex::new(None),
            health: HealthCache::new(),
        })
    }

    async fn ensure_stream(&self) -> DetectResult<(mpsc::Sender<pb::DetectRequest>, WaiterMap)> {
        let mut guard = self.stream.lock().await;
        if let Some(standing) = guard.as_ref() {
            return Ok((standing.req_tx.clone(), standing.waiters.clone()));
        }

        let (req_tx, req_rx) = mpsc::channel::<pb::DetectRequest>(16);
        let waiters: WaiterMap = Arc::new(Mutex::new(HashMap::new()));

        let mut client = self.client.clone();
        let mut response_stream = client
            .detect_stream(ReceiverStream::new(req_rx))
            .await?
            .into_inner();

        let reader_waiters = waiters.clone();
        tokio::spawn(async move {
            loop {
                match response_stream.message().await {
                    Ok(Some(resp)) => {
                        if let Ok(camera_id) = resp.camera_id.parse::<uuid::Uuid>() {
                            let key = (CameraId::from_uuid(camera_id), resp.frame_seq);
                            if let Some(tx) = reader_waiters.lock().await.remove(&key) {
                                let _ = tx.send(resp);
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "gRPC detect stream closed with error");
                        break;
                    }
                }
            }
        });

        *guard = Some(StandingStream {
            req_tx: req_tx.clone(),
            waiters: waiters.clone(),
        });
        Ok((req_tx, waiters))
    }

    fn build_request(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes, return_annotated: bool) -> pb::DetectRequest {
        pb::DetectRequest {
            camera_id: camera_id.to_string(),
            frame_seq,
            timestamp_ns: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            jpeg_data: jpeg.to_vec(),
            return_annotated,
            conf_threshold: 0.5,
            enable_tracking: false,
        }
    }

    fn into_result(&self, camera_id: CameraId, frame_seq: u64, resp: pb::DetectResponse) -> DetectionResult {
        let objects = resp
            .detections
            .into_iter()
            .map(|d| {
                let bbox = d
                    .bbox
                    .map(|b| BoundingBox::from_corners(b.x1, b.y1, b.x2, b.y2))
                    .unwrap_or(BoundingBox::new(0, 0, 0, 0));
                ObjectDetection {
                    class_label: d.class_name,
                    confidence: d.confidence,
                    bbox,
                    track_id: None,
                    category: Some(d.class_id.to_string()),
                }
            })
            .collect();

        DetectionResult {
            camera_id,
            frame_seq,
            timestamp: Utc::now(),
            detector_tag: self.tag.clone(),
            objects,
            faces: Vec::new(),
            annotated_jpeg: resp.annotated_jpeg.map(Bytes::from),
            inference_ms: resp.inference_ms,
        }
    }

    async fn detect_via_standing_stream(
        &self,
        camera_id: CameraId,
        frame_seq: u64,
        jpeg: &Bytes,
    ) -> DetectResult<DetectionResult> {
        let (req_tx, waiters) = self.ensure_stream().await?;
        let (tx, rx) = oneshot::channel();
        waiters.lock().await.insert((camera_id, frame_seq), tx);

        let request = self.build_request(camera_id, frame_seq, jpeg, false);
        if tokio::time::timeout(SEND_TIMEOUT, req_tx.send(request)).await.is_err() {
            waiters.lock().await.remove(&(camera_id, frame_seq));
            return Err(DetectError::Timeout);
        }

        match tokio::time::timeout(RECV_TIMEOUT, rx).await {
            Ok(Ok(resp)) => Ok(self.into_result(camera_id, frame_seq, resp)),
            _ => {
                waiters.lock().await.remove(&(camera_id, frame_seq));
                Err(DetectError::Timeout)
            }
        }
    }
}

#[async_trait]
impl DetectorAdapter for GrpcYoloAdapter {
    fn name(&self) -> &str {
        &self.tag
    }

    fn detector_type(&self) -> DetectorType {
        DetectorType::Object
    }

    async fn is_healthy(&self) -> bool {
        let mut client = self.client.clone();
        self.health
            .get_or_probe(|| async move {
                match client.health_check(pb::HealthCheckRequest {}).await {
                    Ok(resp) => {
                        let inner = resp.into_inner();
                        inner.status == "ok" && inner.model_loaded
                    }
                    Err(_) => false,
                }
            })
            .await
    }

    async fn detect(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        self.detect_via_standing_stream(camera_id, frame_seq, jpeg).await
    }

    async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        // Fresh one-shot stream per call, closed immediately after the
        // first response, to guarantee this specific call gets this
        // specific annotated response regardless of standing-stream load.
        let mut client = self.client.clone();
        let request = self.build_request(camera_id, frame_seq, jpeg, true);
        let outbound = futures::stream::once(async move { request });
        let mut inbound = client.detect_stream(outbound).await?.into_inner();

        match tokio::time::timeout(RECV_TIMEOUT, inbound.message()).await {
            Ok(Ok(Some(resp))) => Ok(self.into_result(camera_id, frame_seq, resp)),
            Ok(Ok(None)) => Err(DetectError::MalformedResponse("stream closed with no response".into())),
            Ok(Err(e)) => Err(DetectError::Grpc(e)),
            Err(_) => Err(DetectError::Timeout),
        }
    }

    fn supports_annotation(&self) -> bool {
        true
    }

    async fn close(&self) {
        *self.stream.lock().await = None;
    }
}
