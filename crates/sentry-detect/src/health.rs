//! Locally cached health probe, shared by every adapter (§4.3).

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

const REFRESH_WINDOW: Duration = Duration::from_secs(30);

struct CachedHealth {
    healthy: bool,
    checked_at: Instant,
}

/// Caches the last probe result; refreshed lazily on next call rather than
/// via a background task, since no per-adapter long-lived task is listed in
/// the §5 task inventory.
pub struct HealthCache {
    state: RwLock<Option<CachedHealth>>,
}

impl HealthCache {
    pub fn new() -> Self {
        Self { state: RwLock::new(None) }
    }

    /// Return the cached value if still fresh, otherwise run `probe` and
    /// cache its result.
    pub async fn get_or_probe<F, Fut>(&self, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        if let Some(cached) = self.state.read().await.as_ref() {
            if cached.checked_at.elapsed() < REFRESH_WINDOW {
                return cached.healthy;
            }
        }

        let healthy = probe().await;
        *self.state.write().await = Some(CachedHealth {
            healthy,
            checked_at: Instant::now(),
        });
        healthy
    }
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new()
    }
}
