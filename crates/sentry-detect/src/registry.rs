//! Detector Registry (§4.3): process singleton holding every registered
//! adapter, keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{DetectError, DetectResult};
use crate::traits::DetectorAdapter;

#[derive(Default)]
pub struct DetectorRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn DetectorAdapter>>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, adapter: Arc<dyn DetectorAdapter>) -> DetectResult<()> {
        let mut adapters = self.adapters.write().await;
        let name = adapter.name().to_string();
        if adapters.contains_key(&name) {
            return Err(DetectError::AlreadyRegistered(name));
        }
        adapters.insert(name, adapter);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> DetectResult<Arc<dyn DetectorAdapter>> {
        self.adapters
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DetectError::NotFound(name.to_string()))
    }

    pub async fn get_all(&self) -> Vec<Arc<dyn DetectorAdapter>> {
        self.adapters.read().await.values().cloned().collect()
    }

    pub async fn get_healthy(&self) -> Vec<Arc<dyn DetectorAdapter>> {
        let mut healthy = Vec::new();
        for adapter in self.get_all().await {
            if adapter.is_healthy().await {
                healthy.push(adapter);
            }
        }
        healthy
    }

    /// Returns matches preserving the caller's order, skipping unhealthy
    /// or unregistered names.
    pub async fn get_healthy_by_names(&self, ordered_names: &[String]) -> Vec<Arc<dyn DetectorAdapter>> {
        let mut result = Vec::with_capacity(ordered_names.len());
        for name in ordered_names {
            if let Ok(adapter) = self.get(name).await {
                if adapter.is_healthy().await {
                    result.push(adapter);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use sentry_models::{CameraId, DetectionResult};

    struct StubAdapter {
        tag: &'static str,
        healthy: bool,
    }

    #[async_trait]
    impl DetectorAdapter for StubAdapter {
        fn name(&self) -> &str {
            self.tag
        }
        fn detector_type(&self) -> crate::traits::DetectorType {
            crate::traits::DetectorType::Object
        }
        async fn is_healthy(&self) -> bool {
            self.healthy
        }
        async fn detect(&self, camera_id: CameraId, frame_seq: u64, _jpeg: &Bytes) -> DetectResult<DetectionResult> {
            Ok(DetectionResult {
                camera_id,
                frame_seq,
                timestamp: chrono::Utc::now(),
                detector_tag: self.tag.to_string(),
                objects: vec![],
                faces: vec![],
                annotated_jpeg: None,
                inference_ms: 0,
            })
        }
        async fn detect_annotated(&self, camera_id: CameraId, frame_seq: u64, jpeg: &Bytes) -> DetectResult<DetectionResult> {
            self.detect(camera_id, frame_seq, jpeg).await
        }
        fn supports_annotation(&self) -> bool {
            false
        }
        async fn close(&self) {}
    }

    #[tokio::test]
    async fn duplicate_register_fails() {
        let registry = DetectorRegistry::new();
        registry
            .register(Arc::new(StubAdapter { tag: "yolo", healthy: true }))
            .await
            .unwrap();
        let err = registry
            .register(Arc::new(StubAdapter { tag: "yolo", healthy: true }))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn get_healthy_by_names_preserves_order_and_skips_unhealthy() {
        let registry = DetectorRegistry::new();
        registry
            .register(Arc::new(StubAdapter { tag: "face", healthy: false }))
            .await
            .unwrap();
        registry
            .register(Arc::new(StubAdapter { tag: "yolo", healthy: true }))
            .await
            .unwrap();

        let names = vec!["yolo".to_string(), "face".to_string(), "missing".to_string()];
        let result = registry.get_healthy_by_names(&names).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "yolo");
    }
}
