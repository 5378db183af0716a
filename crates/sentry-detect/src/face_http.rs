//! HTTP face recognizer adapter (§4.3).
//!
//! Prefers the annotated endpoint, where the server overlays face boxes and
//! landmarks on top of the already-annotated inbound image so the combined
//! visualization includes the prior stage's boxes. On annotated-endpoint
//! failure, falls back to metadata-only.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sentry_models::{BoundingBox, CameraId, DetectionResult, FaceDetection};
use serde::Deserialize;

use crate::error::{DetectError, DetectResult};
use crate::health::HealthCache;
use crate::http::{build_client, with_retry, HttpAdapterConfig};
use crate::traits::{default_should_run, ConditionalRunner, DetectorAdapter, DetectorType};

#[derive(Debug, Deserialize)]
struct WireFace {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    confidence: f32,
    #[serde(default)]
    identity_name: Option<String>,
    #[serde(default)]
    similarity: Option<f32>,
    #[serde(default)]
    is_known: bool,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    crop_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    faces: Vec<WireFace>,
    #[serde(default)]
    inference_ms: u64,
    #[serde(default)]
    annotated_jpeg_base64: Option<String>,
}

pub struct HttpFaceAdapter {
    http: Client,
    config: HttpAdapterConfig,
    health: HealthCache,
    trigger_classes: Vec<String>,
}

impl HttpFaceAdapter {
    pub fn new(config: HttpAdapterConfig) -> DetectResult<Self> {
        Ok(Self {
            http: build_client(&config)?,
            config,
            health: HealthCache::new(),
            trigger_classes: vec!["person".to_string()],
        })
    }

    async fn call(&self, path: &str, jpeg: &Bytes) -> DetectResult<WireResponse> {
        let url = format!("{}{}", self.config.base_url, path);
        with_retry(self.config.max_retries, || async {
            let form = Form::new().part("file", Part::bytes(jpeg.to_vec()).file_name("frame.jpg"));
            let resp = self.http.post(&url).multipart(form).send().await?;
            if !resp.status().is_success() {
                return Err(DetectError::MalformedResponse(format!(
                    "{} returned {}",
                    path,
                    resp.status()
                )));
            }
            resp.json::<WireResponse>().await.map_err(DetectError::Http)
        })
        .await
    }

    fn into_result(&self, camera_id: CameraId, frame_seq: u64, wire: WireResponse) -> DetectionResult {
        let faces = wire
            .faces
            .into_iter()
            .map(|f| FaceDetection {
                bbox: BoundingBox::from_corners(f.x1, f.y1, f.x2, f.y2),
                confidence: f.confidence,
                identity_name: f.identity_name,
                similarity: f.similarity,
                is_known: f.is_known,
                age: f.age,
                gender: f.gender,
                person_track_id: None,
                crop_base64: f.crop_base64,
            })
            .collect();

        let annotated_jpeg = wire
            .annotated_jpeg_base64
            .as_deref()
            .and_then(|b64| base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64).ok())
            .map(Bytes::from);

        DetectionResult {
            camera_id,
            frame_seq,
            timestamp: Utc::now(),
            detector_tag: "face".to_string(),
            objects: Vec::new(),
            faces,
            annotated_jpeg,
            inference_ms: wire.inference_ms,
        }
    }
}

#[async_trait]
impl DetectorAdapter for HttpFaceAdapter {
    fn name(&self) -> &str {
        "face"
    }

    fn detector_type(&self) -> DetectorType {
        DetectorType::Face
    }

    async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        let http = &self.http;
        self.health
            .get_or_probe(|| async move {
                matches!(http.get(&url).send().await, Ok(r) if r.status().is_success())
            })
            .await
    }

    async fn detect(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        let wire = self.call("/detect", jpeg).await?;
        Ok(self.into_result(camera_id, frame_seq, wire))
    }

    async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        match self.call("/recognize/annotated", jpeg).await {
            Ok(wire) => Ok(self.into_result(camera_id, frame_seq, wire)),
            Err(e) => {
                tracing::warn!(error = %e, "annotated face recognition failed, falling back to metadata-only");
                let wire = self.call("/recognize", jpeg).await?;
                Ok(self.into_result(camera_id, frame_seq, wire))
            }
        }
    }

    fn supports_annotation(&self) -> bool {
        true
    }

    async fn close(&self) {}

    fn as_conditional_runner(&self) -> Option<&dyn ConditionalRunner> {
        Some(self)
    }
}

impl ConditionalRunner for HttpFaceAdapter {
    fn should_run(&self, prior: &DetectionResult) -> bool {
        default_should_run(prior, &self.trigger_classes)
    }

    fn trigger_classes(&self) -> &[String] {
        &self.trigger_classes
    }
}
