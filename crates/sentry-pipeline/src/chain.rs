//! Sequential detector chain (§4.5 steps 1-3).
//!
//! Parallel execution across detectors is explicitly out of scope: it was
//! observed to cause "time-travel" artifacts (stale boxes overlaid on newer
//! frames), so detectors run one at a time, in order, within one pipeline.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use sentry_detect::DetectorAdapter;
use sentry_models::{CameraId, DetectionResult, MergedDetectionResult};
use tracing::warn;

fn is_primary_name(name: &str) -> bool {
    name == "yolo" || name == "dino"
}

fn find_primary(detectors: &[Arc<dyn DetectorAdapter>]) -> Option<usize> {
    detectors.iter().position(|d| is_primary_name(d.name()))
}

/// Runs the primary detector then every remaining detector in order,
/// merging single-stage results into one `MergedDetectionResult`.
///
/// Returns `None` if there is no configured primary detector, or if every
/// stage that ran failed (§4.5 "If all stages failed, no publication
/// occurs").
pub async fn run(
    detectors: &[Arc<dyn DetectorAdapter>],
    camera_id: CameraId,
    frame_seq: u64,
    jpeg: &Bytes,
) -> Option<(MergedDetectionResult, Option<DetectionResult>)> {
    let primary_idx = match find_primary(detectors) {
        Some(idx) => idx,
        None => {
            warn!(%camera_id, "no primary (yolo/dino) detector configured, skipping chain");
            return None;
        }
    };

    let mut objects = Vec::new();
    let mut faces = Vec::new();
    let mut total_inference_ms: u64 = 0;
    let mut working_image: Option<Bytes> = None;
    let mut any_stage_succeeded = false;
    let mut primary_result: Option<DetectionResult> = None;

    let primary = &detectors[primary_idx];
    match primary.detect_annotated(camera_id, frame_seq, jpeg).await {
        Ok(result) => {
            any_stage_succeeded = true;
            total_inference_ms += result.inference_ms;
            working_image = result.annotated_jpeg.clone();
            objects.extend(result.objects.clone());
            faces.extend(result.faces.clone());
            let is_empty = result.is_empty();
            primary_result = Some(result);

            if is_empty {
                // §4.5: a totally empty primary result short-circuits the
                // chain — there is nothing for a conditional downstream
                // detector (face) to react to.
                return Some((
                    finalize(camera_id, frame_seq, objects, faces, working_image, jpeg.clone(), total_inference_ms),
                    primary_result,
                ));
            }
        }
        Err(e) => {
            warn!(%camera_id, detector = primary.name(), error = %e, "primary detector stage failed, skipping");
        }
    }

    for (idx, detector) in detectors.iter().enumerate() {
        if idx == primary_idx {
            continue;
        }

        if let Some(runner) = detector.as_conditional_runner() {
            match &primary_result {
                Some(prior) if runner.should_run(prior) => {}
                _ => continue,
            }
        }

        let image = working_image.as_ref().unwrap_or(jpeg);
        match detector.detect_annotated(camera_id, frame_seq, image).await {
            Ok(result) => {
                any_stage_succeeded = true;
                total_inference_ms += result.inference_ms;
                objects.extend(result.objects);
                if result.annotated_jpeg.is_some() && detector.name() == "face" {
                    // Only the face stage is permitted to replace the
                    // working image: the face service renders on top of the
                    // inbound (already-annotated) image.
                    working_image = result.annotated_jpeg;
                }
                faces.extend(result.faces);
            }
            Err(e) => {
                warn!(%camera_id, detector = detector.name(), error = %e, "detector stage failed, skipping");
            }
        }
    }

    if !any_stage_succeeded {
        return None;
    }

    Some((
        finalize(camera_id, frame_seq, objects, faces, working_image, jpeg.clone(), total_inference_ms),
        primary_result,
    ))
}

fn finalize(
    camera_id: CameraId,
    frame_seq: u64,
    objects: Vec<sentry_models::ObjectDetection>,
    faces: Vec<sentry_models::FaceDetection>,
    annotated_jpeg: Option<Bytes>,
    raw_jpeg: Bytes,
    total_inference_ms: u64,
) -> MergedDetectionResult {
    let has_motion = !objects.is_empty() || !faces.is_empty();
    MergedDetectionResult {
        camera_id,
        frame_seq,
        timestamp: Utc::now(),
        objects,
        faces,
        annotated_jpeg,
        raw_jpeg: Some(raw_jpeg),
        total_inference_ms,
        has_motion,
        events_suppressed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentry_detect::{ConditionalRunner, DetectError, DetectResult, DetectorType};
    use sentry_models::{BoundingBox, CameraId, FaceDetection, ObjectDetection};

    struct StubDetector {
        name: &'static str,
        detector_type: DetectorType,
        result: Option<DetectionResult>,
        trigger_classes: Vec<String>,
        conditional: bool,
    }

    fn empty_result(tag: &str, camera_id: CameraId, seq: u64) -> DetectionResult {
        DetectionResult {
            camera_id,
            frame_seq: seq,
            timestamp: Utc::now(),
            detector_tag: tag.to_string(),
            objects: vec![],
            faces: vec![],
            annotated_jpeg: None,
            inference_ms: 5,
        }
    }

    #[async_trait]
    impl DetectorAdapter for StubDetector {
        fn name(&self) -> &str {
            self.name
        }
        fn detector_type(&self) -> DetectorType {
            self.detector_type
        }
        async fn is_healthy(&self) -> bool {
            true
        }
        async fn detect(&self, camera_id: CameraId, frame_seq: u64, _jpeg: &Bytes) -> DetectResult<DetectionResult> {
            Ok(self.result.clone().unwrap_or_else(|| empty_result(self.name, camera_id, frame_seq)))
        }
        async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
            self.detect(camera_id, frame_seq, jpeg).await
        }
        fn supports_annotation(&self) -> bool {
            true
        }
        async fn close(&self) {}
        fn as_conditional_runner(&self) -> Option<&dyn ConditionalRunner> {
            if self.conditional {
                Some(self)
            } else {
                None
            }
        }
    }

    impl ConditionalRunner for StubDetector {
        fn should_run(&self, prior: &DetectionResult) -> bool {
            sentry_detect::default_should_run(prior, &self.trigger_classes)
        }
        fn trigger_classes(&self) -> &[String] {
            &self.trigger_classes
        }
    }

    #[tokio::test]
    async fn empty_primary_result_short_circuits_chain() {
        let camera_id = CameraId::new();
        let detectors: Vec<Arc<dyn DetectorAdapter>> = vec![
            Arc::new(StubDetector {
                name: "yolo",
                detector_type: DetectorType::Object,
                result: None,
                trigger_classes: vec![],
                conditional: false,
            }),
            Arc::new(StubDetector {
                name: "face",
                detector_type: DetectorType::Face,
                result: Some(DetectionResult {
                    faces: vec![FaceDetection {
                        bbox: BoundingBox::new(0, 0, 1, 1),
                        confidence: 0.9,
                        identity_name: None,
                        similarity: None,
                        is_known: false,
                        age: None,
                        gender: None,
                        person_track_id: None,
                        crop_base64: None,
                    }],
                    ..empty_result("face", camera_id, 1)
                }),
                trigger_classes: vec!["person".into()],
                conditional: true,
            }),
        ];

        let (merged, _) = super::run(&detectors, camera_id, 1, &Bytes::from_static(b"jpeg")).await.unwrap();
        assert!(merged.faces.is_empty());
        assert!(!merged.has_motion);
    }

    #[tokio::test]
    async fn conditional_detector_runs_after_matching_primary_class() {
        let camera_id = CameraId::new();
        let primary_result = DetectionResult {
            objects: vec![ObjectDetection {
                class_label: "person".into(),
                confidence: 0.9,
                bbox: BoundingBox::new(0, 0, 5, 5),
                track_id: None,
                category: None,
            }],
            ..empty_result("yolo", camera_id, 1)
        };
        let face_result = DetectionResult {
            faces: vec![FaceDetection {
                bbox: BoundingBox::new(1, 1, 2, 2),
                confidence: 0.8,
                identity_name: Some("alice".into()),
                similarity: Some(0.95),
                is_known: true,
                age: None,
                gender: None,
                person_track_id: None,
                crop_base64: None,
            }],
            annotated_jpeg: Some(Bytes::from_static(b"face-annotated")),
            ..empty_result("face", camera_id, 1)
        };

        let detectors: Vec<Arc<dyn DetectorAdapter>> = vec![
            Arc::new(StubDetector {
                name: "yolo",
                detector_type: DetectorType::Object,
                result: Some(primary_result),
                trigger_classes: vec![],
                conditional: false,
            }),
            Arc::new(StubDetector {
                name: "face",
                detector_type: DetectorType::Face,
                result: Some(face_result),
                trigger_classes: vec!["person".into()],
                conditional: true,
            }),
        ];

        let (merged, primary) = super::run(&detectors, camera_id, 1, &Bytes::from_static(b"jpeg")).await.unwrap();
        assert_eq!(merged.faces.len(), 1);
        assert!(merged.has_motion);
        assert_eq!(merged.annotated_jpeg, Some(Bytes::from_static(b"face-annotated")));
        assert!(primary.is_some());
    }

    #[tokio::test]
    async fn missing_primary_detector_yields_no_publication() {
        let camera_id = CameraId::new();
        let detectors: Vec<Arc<dyn DetectorAdapter>> = vec![Arc::new(StubDetector {
            name: "face",
            detector_type: DetectorType::Face,
            result: None,
            trigger_classes: vec![],
            conditional: false,
        })];

        assert!(super::run(&detectors, camera_id, 1, &Bytes::from_static(b"jpeg")).await.is_none());
    }
}
