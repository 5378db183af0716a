//! HTTP fallback adapter for object detectors (YOLO/DINO), used when gRPC
//! is unavailable (§4.3).

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sentry_models::{BoundingBox, CameraId, DetectionResult, ObjectDetection};
use serde::Deserialize;

use crate::error::{DetectError, DetectResult};
use crate::health::HealthCache;
use crate::http::{build_client, with_retry, HttpAdapterConfig};
use crate::traits::{DetectorAdapter, DetectorType};

#[derive(Debug, Deserialize)]
struct WireDetection {
    class_name: String,
    #[serde(default)]
    class_id: Option<i64>,
    confidence: f32,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    detections: Vec<WireDetection>,
    #[serde(default)]
    inference_ms: u64,
    #[serde(default)]
    annotated_jpeg_base64: Option<String>,
}

/// Object-detector adapter name, e.g. "yolo" or "dino".
pub struct HttpObjectAdapter {
    tag: String,
    http: Client,
    config: HttpAdapterConfig,
    health: HealthCache,
}

impl HttpObjectAdapter {
    pub fn new(tag: impl Into<String>, config: HttpAdapterConfig) -> DetectResult<Self> {
        Ok(Self {
            tag: tag.into(),
            http: build_client(&config)?,
            config,
            health: HealthCache::new(),
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
        let objects = wire
            .detections
            .into_iter()
            .map(|d| ObjectDetection {
                class_label: d.class_name,
                confidence: d.confidence,
                bbox: BoundingBox::from_corners(d.x1, d.y1, d.x2, d.y2),
                track_id: None,
                category: d.class_id.map(|id| id.to_string()),
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
            detector_tag: self.tag.clone(),
            objects,
            faces: Vec::new(),
            annotated_jpeg,
            inference_ms: wire.inference_ms,
        }
    }
}

#[async_trait]
impl DetectorAdapter for HttpObjectAdapter {
    fn name(&self) -> &str {
        &self.tag
    }

    fn detector_type(&self) -> DetectorType {
        DetectorType::Object
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
        let wire = self.call("/detect/motion", jpeg).await?;
        Ok(self.into_result(camera_id, frame_seq, wire))
    }

    async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
        let wire = self.call("/analyze/scene", jpeg).await?;
        Ok(self.into_result(camera_id, frame_seq, wire))
    }

    fn supports_annotation(&self) -> bool {
        true
    }

    async fn close(&self) {}
}
