//! Alert cooldown cache (§4.8, §9 "global mutable state").
//!
//! A bounded `Mutex<HashMap>` pruned on overflow rather than an external TTL
//! store, mirroring the cache-entries-keyed-and-pruned shape the teacher
//! uses for `vclip-storage::neural_cache` (key -> cached value, pruned by
//! the caller rather than by a background sweep).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sentry_models::CameraId;

/// Cooldown is tracked per camera (the "action type" in §4.8 is "send an
/// alert for this camera").
pub type CooldownKey = CameraId;

pub struct CooldownCache {
    window: Duration,
    last_sent: Mutex<HashMap<CooldownKey, Instant>>,
}

impl CooldownCache {
    pub fn new(window: Duration) -> Self {
        Self { window, last_sent: Mutex::new(HashMap::new()) }
    }

    /// Returns true if an alert for `key` may be sent now (no prior send, or
    /// the window has elapsed since the last successful send).
    pub fn may_send(&self, key: CooldownKey) -> bool {
        let last_sent = self.last_sent.lock().unwrap();
        match last_sent.get(&key) {
            Some(last) => last.elapsed() >= self.window,
            None => true,
        }
    }

    /// Records a successful send at "now", pruning the cache first if it has
    /// grown past `2 * window`'s worth of entries.
    pub fn record_sent(&self, key: CooldownKey) {
        let mut last_sent = self.last_sent.lock().unwrap();
        if last_sent.len() > 2 * self.window.as_secs().max(1) as usize {
            let window = self.window;
            last_sent.retain(|_, ts| ts.elapsed() < window);
        }
        last_sent.insert(key, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_send_always_allowed() {
        let cache = CooldownCache::new(Duration::from_secs(30));
        assert!(cache.may_send(CameraId::new()));
    }

    #[test]
    fn second_send_within_window_is_blocked() {
        let cache = CooldownCache::new(Duration::from_secs(30));
        let key = CameraId::new();
        cache.record_sent(key);
        assert!(!cache.may_send(key));
    }

    #[test]
    fn send_after_short_window_is_allowed() {
        let cache = CooldownCache::new(Duration::from_millis(10));
        let key = CameraId::new();
        cache.record_sent(key);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.may_send(key));
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let cache = CooldownCache::new(Duration::from_secs(30));
        let a = CameraId::new();
        let b = CameraId::new();
        cache.record_sent(a);
        assert!(cache.may_send(b));
    }
}
