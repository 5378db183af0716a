//! Detection Pipeline (C5) and Event Bus (C6).

mod chain;
mod motion;
mod pipeline;

pub mod bus;
pub mod error;
pub mod registry;
pub mod stats;

pub use bus::{BusSubscriptionId, EventBus, Handler, DEFAULT_CHANNEL_BUFFER};
pub use error::{PipelineError, PipelineResult};
pub use motion::ByteSizeMotionDetector;
pub use registry::PipelineRegistry;
pub use stats::{PipelineStats, PipelineStatsSnapshot};
