//! Frame Distributor (C2): fans one camera's frame stream to N subscribers
//! with per-subscriber bounded queue and drop-on-full policy.

use std::collections::HashMap;
use std::sync::Arc;

use sentry_models::{Frame, SubscriptionId};
use tokio::sync::{mpsc, watch, RwLock};

use crate::stats::CaptureStats;

struct SubscriberHandle {
    tx: mpsc::Sender<Frame>,
    cancel_tx: watch::Sender<bool>,
}

/// Lives inside the capturer's per-camera state (§4.2).
///
/// Iteration over subscriptions happens under a read-lock; subscribe/
/// unsubscribe take a write-lock — subscriptions are never iterated under
/// the write half (§5 invariant b).
#[derive(Default)]
pub struct Distributor {
    subscribers: RwLock<HashMap<SubscriptionId, SubscriberHandle>>,
}

impl Distributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber with a bounded queue of `max(buffer_size, 5)`.
    pub async fn subscribe(
        &self,
        buffer_size: usize,
    ) -> (SubscriptionId, mpsc::Receiver<Frame>, watch::Receiver<bool>) {
        let id = SubscriptionId::new();
        let (tx, rx) = mpsc::channel(buffer_size.max(5));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.subscribers
            .write()
            .await
            .insert(id, SubscriberHandle { tx, cancel_tx });
        (id, rx, cancel_rx)
    }

    /// Idempotent: closing the cancel signal twice is a no-op.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(handle) = self.subscribers.write().await.remove(&id) {
            let _ = handle.cancel_tx.send(true);
        }
    }

    /// Non-blocking fan-out: a full queue is counted as a drop and skipped,
    /// never blocking the producer (§5 invariant, §8 invariant 3).
    pub async fn distribute(&self, frame: &Frame, stats: &Arc<CaptureStats>) {
        let subscribers = self.subscribers.read().await;
        for handle in subscribers.values() {
            match handle.tx.try_send(frame.clone()) {
                Ok(()) => {}
                Err(_) => stats.record_drop(),
            }
        }
    }

    /// Signal cancellation on every subscriber and drop them all.
    pub async fn close_all(&self) {
        let mut subscribers = self.subscribers.write().await;
        for handle in subscribers.values() {
            let _ = handle.cancel_tx.send(true);
        }
        subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sentry_models::CameraId;

    fn frame(seq: u64) -> Frame {
        Frame::new(CameraId::new(), seq, Bytes::from_static(b"jpeg"), 0, 0)
    }

    #[tokio::test]
    async fn slow_subscriber_drops_without_blocking_others() {
        let dist = Distributor::new();
        let (_id_slow, mut slow_rx, _c1) = dist.subscribe(1).await;
        let (_id_fast, mut fast_rx, _c2) = dist.subscribe(5).await;
        let stats = Arc::new(CaptureStats::default());

        for seq in 1..=10 {
            dist.distribute(&frame(seq), &stats).await;
            // Fast subscriber drains immediately; slow one never does.
            let _ = fast_rx.try_recv();
        }

        assert!(stats.snapshot().frames_dropped > 0);
        assert!(slow_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unsubscribe_signals_cancel() {
        let dist = Distributor::new();
        let (id, _rx, mut cancel_rx) = dist.subscribe(5).await;
        dist.unsubscribe(id).await;
        assert!(cancel_rx.changed().await.is_ok());
        assert!(*cancel_rx.borrow());
    }
}
