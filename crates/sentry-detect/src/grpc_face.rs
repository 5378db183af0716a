//! gRPC bidirectional-streaming face recognizer adapter (§4.3, §6
//! "Recognition wire"), serving `RECOGNITION_GRPC_ENDPOINT`. Same
//! standing-stream/waiter-map shape as `grpc_yolo::GrpcYoloAdapter`, since
//! the recognizer's wire contract is the same request/response-correlated
//! streaming RPC, just with face messages instead of object detections.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sentry_models::{BoundingBox, CameraId, DetectionResult, FaceDetection};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tracing::warn;

use crate::error::{DetectError, DetectResult};
use crate::health::HealthCache;
use crate::traits::{default_should_run, ConditionalRunner, DetectorAdapter, DetectorType};

use crate::pb;
use pb::recognizer_client::RecognizerClient;

const SEND_TIMEOUT: Duration = Duration::from_millis(100);
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

type WaiterKey = (CameraId, u64);
type WaiterMap = Arc<Mutex<HashMap<WaiterKey, oneshot::Sender<pb::RecognizeResponse>>>>;

struct StandingStream {
    req_tx: mpsc::Sender<pb::RecognizeRequest>,
    waiters: WaiterMap,
}

pub struct GrpcFaceAdapter {
    client: RecognizerClient<Channel>,
    stream: Mutex<Option<StandingStream>>,
    health: HealthCache,
    trigger_classes: Vec<String>,
}

impl GrpcFaceAdapter {
    pub fn new(endpoint: impl Into<String>) -> DetectResult<Self> {
        let channel = Channel::from_shared(endpoint.into())
            .map_err(|e| DetectError::GrpcConnect(tonic::transport::Error::from(e)))?
            .connect_lazy();
        Ok(Self {
            client: RecognizerClient::new(channel),
            stream: Mutex::new(None),
            health: HealthCache::new(),
            trigger_classes: vec!["person".to_string()],
        })
    }

    async fn ensure_stream(&self) -> DetectResult<(mpsc::Sender<pb::RecognizeRequest>, WaiterMap)> {
        let mut guard = self.stream.lock().await;
        if let Some(standing) = guard.as_ref() {
            return Ok((standing.req_tx.clone(), standing.waiters.clone()));
        }

        let (req_tx, req_rx) = mpsc::channel::<pb::RecognizeRequest>(16);
        let waiters: WaiterMap = Arc::new(Mutex::new(HashMap::new()));

        let mut client = self.client.clone();
        let mut response_stream = client
            .recognize_stream(ReceiverStream::new(req_rx))
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
                        warn!(error = %e, "gRPC recognize stream closed with error");
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

    fn build_request(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes, return_annotated: bool) -> pb::RecognizeRequest {
        pb::RecognizeRequest {
            camera_id: camera_id.to_string(),
            frame_seq,
            timestamp_ns: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            jpeg_data: jpeg.to_vec(),
            return_annotated,
        }
    }

    fn into_result(&self, camera_id: CameraId, frame_seq: u64, resp: pb::RecognizeResponse) -> DetectionResult {
        let faces = resp
            .faces
            .into_iter()
            .map(|f| {
                let bbox = f
                    .bbox
                    .map(|b| BoundingBox::from_corners(b.x1, b.y1, b.x2, b.y2))
                    .unwrap_or(BoundingBox::new(0, 0, 0, 0));
                FaceDetection {
                    bbox,
                    confidence: f.confidence,
                    identity_name: f.identity_name,
                    similarity: f.similarity,
                    is_known: f.is_known,
                    age: f.age,
                    gender: f.gender,
                    person_track_id: None,
                    crop_base64: f
                        .crop_jpeg
                        .map(|bytes| base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)),
                }
            })
            .collect();

        DetectionResult {
            camera_id,
            frame_seq,
            timestamp: Utc::now(),
            detector_tag: "face".to_string(),
            objects: Vec::new(),
            faces,
            annotated_jpeg: resp.annotated_jpeg.map(Bytes::from),
            inference_ms: resp.inference_ms,
        }
    }

    async fn recognize_via_standing_stream(
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
impl DetectorAdapter for GrpcFaceAdapter {
    fn name(&self) -> &str {
        "face"
    }

    fn detector_type(&self) -> DetectorType {
        DetectorType::Face
    }

    async fn is_healthy(&self) -> bool {
        let mut client = self.client.clone();
        self.health
            .get_or_probe(|| async move {
                matches!(
                    client.health_check(pb::HealthCheckRequest {}).await,
                    Ok(resp) if resp.into_inner().status == "ok"
                )
            })
            .await
    }

    async fn detect(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        self.recognize_via_standing_stream(camera_id, frame_seq, jpeg).await
    }

    async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        let mut client = self.client.clone();
        let request = self.build_request(camera_id, frame_seq, jpeg, true);
        let outbound = futures::stream::once(async move { request });
        let mut inbound = client.recognize_stream(outbound).await?.into_inner();

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

    fn as_conditional_runner(&self) -> Option<&dyn ConditionalRunner> {
        Some(self)
    }
}

impl ConditionalRunner for GrpcFaceAdapter {
    fn should_run(&self, prior: &DetectionResult) -> bool {
        default_should_run(prior, &self.trigger_classes)
    }

    fn trigger_classes(&self) -> &[String] {
        &self.trigger_classes
    }
}
