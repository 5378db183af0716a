//! Frame Capturer (C1) and Frame Distributor (C2).
//!
//! One subprocess or HTTP poller per active camera produces a monotonic
//! sequence of JPEG frames; the distributor fans each frame out to N
//! subscribers with bounded per-subscriber buffering and drop-on-full
//! semantics, never blocking the producer.

pub mod device;
pub mod distributor;
pub mod error;
pub mod ffmpeg;
pub mod http_poll;
pub mod jpeg;
pub mod process;
pub mod registry;
pub mod stats;

pub use device::{classify, DeviceKind};
pub use error::{CaptureError, CaptureResult};
pub use registry::CaptureRegistry;
pub use stats::StatsSnapshot;
