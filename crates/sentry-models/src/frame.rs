//! Frame and subscription models (§3: Frame, Subscription).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::ids::CameraId;

/// One captured JPEG frame.
///
/// Created by the frame capturer (C1) and read-only for every downstream
/// consumer: there is no in-place mutation once a frame is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub camera_id: CameraId,
    /// Monotonic sequence number, strictly increasing within one capturer
    /// instance. Starts at 1 and resets whenever a new capture subprocess
    /// starts.
    pub seq: u64,
    pub captured_at: DateTime<Utc>,
    #[serde(skip)]
    pub jpeg: bytes::Bytes,
    /// Declared pixel width; zero if the source didn't parse one.
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(camera_id: CameraId, seq: u64, jpeg: bytes::Bytes, width: u32, height: u32) -> Self {
        Self {
            camera_id,
            seq,
            captured_at: Utc::now(),
            jpeg,
            width,
            height,
        }
    }
}

/// Opaque handle identifying one subscription to a camera's frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer attached to one camera's frame stream (§3: Subscription).
///
/// The receiving half of a bounded FIFO plus a cancel signal. After cancel,
/// the queue is not read from and the signal is observable by all parties.
pub struct Subscription {
    pub id: SubscriptionId,
    pub camera_id: CameraId,
    pub frames: tokio::sync::mpsc::Receiver<Frame>,
    pub cancel: watch::Receiver<bool>,
}

impl Subscription {
    /// True once the owning distributor has signalled cancellation.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}
