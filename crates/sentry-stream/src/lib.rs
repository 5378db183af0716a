//! Stream Overlay Provider (C7): latest-annotated-frame store fanned out
//! over MJPEG pull, WebSocket push, and snapshot endpoints.

pub mod error;
pub mod mjpeg;
pub mod overlay;
pub mod raw_adapter;
pub mod routes;
pub mod snapshot;
pub mod ws_detections;
pub mod ws_push;

pub use error::{StreamError, StreamResult};
pub use overlay::{AnnotatedFrame, DetectionMeta, StreamProvider};
pub use raw_adapter::spawn_raw_bridge;
pub use routes::router;
