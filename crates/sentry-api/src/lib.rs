//! Axum HTTP/WebSocket API server: camera admin CRUD, the C7 stream
//! overlay router, and the process-wide composition root.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
