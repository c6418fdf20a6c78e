use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::timestamp::TIMESTAMP_WINDOW_SECS;

/// Nonce retention. Double the timestamp window, so any nonce whose
/// timestamp is still acceptable is guaranteed to still be held.
pub const NONCE_TTL: Duration = Duration::from_secs(2 * TIMESTAMP_WINDOW_SECS as u64);

#[derive(Debug, Error)]
#[error("replay store unavailable: {0}")]
pub struct ReplayStoreError(pub String);

/// One atomic set-if-absent-with-TTL operation. Any KV store with an atomic
/// conditional set can back this; the caller must treat errors as a
/// rejection, never as "probably fresh".
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Ok(true): the key was fresh and is now reserved for `ttl`.
    /// Ok(false): the key was already reserved.
    async fn reserve(&self, key: &str, ttl: Duration) -> Result<bool, ReplayStoreError>;
}

/// Nonce scope is per-device: the same opaque nonce value from two devices
/// must not collide.
pub fn nonce_key(device_id: &Uuid, nonce: &str) -> String {
    format!("{}:{}", device_id, nonce)
}

/// Process-local replay store. Good enough for a single replica and for
/// tests; multi-replica deployments use the shared SQLite-backed store.
#[derive(Default)]
pub struct InMemoryReplayStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn reserve(&self, key: &str, ttl: Duration) -> Result<bool, ReplayStoreError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| ReplayStoreError(e.to_string()))?;

        entries.retain(|_, expires_at| *expires_at > now);

        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), now + ttl);
        Ok(true)
    }
}
