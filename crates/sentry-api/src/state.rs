//! Application state: the process-wide composition root wiring C1, C3,
//! C5, C6, C7, C8, C9 together, following `vclip_api::state::AppState`.

use std::sync::Arc;

use sentry_capture::CaptureRegistry;
use sentry_detect::{DetectorRegistry, GrpcFaceAdapter, GrpcYoloAdapter, HttpAdapterConfig, HttpFaceAdapter, HttpObjectAdapter};
use sentry_events::{CooldownCache, EventSink, InMemoryAlertDispatcher, InMemoryEventStore, TelegramDispatcher, ThumbnailWriter};
use sentry_orchestrator::CameraOrchestrator;
use sentry_pipeline::{EventBus, PipelineRegistry};
use sentry_stream::StreamProvider;
use tracing::{info, warn};

use crate::config::ApiConfig;

/// Shared application state. The storage collaborator is the in-memory
/// `EventStore` default (§1 scope boundary: SQLite schema is consumed, not
/// defined, by this core).
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub capture: Arc<CaptureRegistry>,
    pub detectors: Arc<DetectorRegistry>,
    pub pipelines: Arc<PipelineRegistry>,
    pub stream: Arc<StreamProvider>,
    pub store: Arc<InMemoryEventStore>,
    pub orchestrator: Arc<CameraOrchestrator<InMemoryEventStore>>,
}

impl AppState {
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let events_config = sentry_events::config::EventsConfig::from_env();

        let capture = Arc::new(CaptureRegistry::new());
        let detectors = Arc::new(DetectorRegistry::new());
        let pipelines = Arc::new(PipelineRegistry::new(Arc::new(EventBus::new())));
        let stream = Arc::new(StreamProvider::new());
        let store = Arc::new(InMemoryEventStore::new());

        register_detectors(&detectors, &config).await;

        let thumbnails = Arc::new(ThumbnailWriter::new(events_config.frame_dir.clone().into()));
        let cooldown = Arc::new(CooldownCache::new(events_config.cooldown));

        let orchestrator = if events_config.telegram_configured() {
            info!("Telegram alert dispatcher configured");
            let dispatcher = Arc::new(TelegramDispatcher::new(
                events_config.telegram_bot_token.clone().unwrap(),
                events_config.telegram_chat_id.clone().unwrap(),
            ));
            let sink = Arc::new(EventSink::new(store.clone(), dispatcher, thumbnails, cooldown));
            CameraOrchestrator::new(capture.clone(), detectors.clone(), pipelines.clone(), stream.clone(), store.clone(), sink).await
        } else {
            warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set, alerts will only be recorded in memory");
            let dispatcher = Arc::new(InMemoryAlertDispatcher::new());
            let sink = Arc::new(EventSink::new(store.clone(), dispatcher, thumbnails, cooldown));
            CameraOrchestrator::new(capture.clone(), detectors.clone(), pipelines.clone(), stream.clone(), store.clone(), sink).await
        };

        Ok(Self {
            config,
            capture,
            detectors,
            pipelines,
            stream,
            store,
            orchestrator: Arc::new(orchestrator),
        })
    }
}

/// Registers the YOLO/recognition adapters named in §6's wire contracts.
/// For each, gRPC is used when its endpoint is configured, else the HTTP
/// fallback.
async fn register_detectors(detectors: &DetectorRegistry, config: &ApiConfig) {
    if config.yolo_enabled {
        if let Some(endpoint) = &config.yolo_grpc_endpoint {
            match GrpcYoloAdapter::new("yolo", endpoint.clone()) {
                Ok(adapter) => {
                    let _ = detectors.register(Arc::new(adapter)).await;
                }
                Err(e) => warn!(error = %e, "failed to construct gRPC YOLO adapter"),
            }
        } else {
            let http_config = HttpAdapterConfig::from_env("YOLO_ENDPOINT", &config.yolo_http_endpoint);
            match HttpObjectAdapter::new("yolo", http_config) {
                Ok(adapter) => {
                    let _ = detectors.register(Arc::new(adapter)).await;
                }
                Err(e) => warn!(error = %e, "failed to construct HTTP YOLO adapter"),
            }
        }
    }

    if config.recognition_enabled {
        if let Some(endpoint) = &config.recognition_grpc_endpoint {
            match GrpcFaceAdapter::new(endpoint.clone()) {
                Ok(adapter) => {
                    let _ = detectors.register(Arc::new(adapter)).await;
                }
                Err(e) => warn!(error = %e, "failed to construct gRPC face adapter"),
            }
        } else {
            let http_config = HttpAdapterConfig::from_env("RECOGNITION_SERVICE_ENDPOINT", &config.recognition_http_endpoint);
            match HttpFaceAdapter::new(http_config) {
                Ok(adapter) => {
                    let _ = detectors.register(Arc::new(adapter)).await;
                }
                Err(e) => warn!(error = %e, "failed to construct HTTP face adapter"),
            }
        }
    }
}
