//! API server configuration (§6).

/// Top-level binary configuration: HTTP bind address plus the ambient
/// toggles every other crate's `XxxConfig::from_env()` doesn't own.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub metrics_enabled: bool,
    pub yolo_enabled: bool,
    pub yolo_grpc_endpoint: Option<String>,
    pub yolo_http_endpoint: String,
    pub yolo_draw_boxes: bool,
    pub recognition_enabled: bool,
    pub recognition_grpc_endpoint: Option<String>,
    pub recognition_http_endpoint: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "development".to_string(),
            metrics_enabled: true,
            yolo_enabled: true,
            yolo_grpc_endpoint: None,
            yolo_http_endpoint: "http://localhost:8001".to_string(),
            yolo_draw_boxes: true,
            recognition_enabled: false,
            recognition_grpc_endpoint: None,
            recognition_http_endpoint: "http://localhost:8002".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            yolo_enabled: std::env::var("YOLO_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.yolo_enabled),
            yolo_grpc_endpoint: std::env::var("YOLO_GRPC_ENDPOINT").ok(),
            yolo_http_endpoint: std::env::var("YOLO_ENDPOINT").unwrap_or(defaults.yolo_http_endpoint),
            yolo_draw_boxes: std::env::var("YOLO_DRAW_BOXES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.yolo_draw_boxes),
            recognition_enabled: std::env::var("RECOGNITION_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.recognition_enabled),
            recognition_grpc_endpoint: std::env::var("RECOGNITION_GRPC_ENDPOINT").ok(),
            recognition_http_endpoint: std::env::var("RECOGNITION_SERVICE_ENDPOINT").unwrap_or(defaults.recognition_http_endpoint),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
