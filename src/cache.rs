//! Response cache policies for the upstream client.
//!
//! The catalog is read-only, so entries are never invalidated: they simply
//! expire after the configured TTL. Keys are full request URLs (endpoint
//! plus query parameters).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Upper bound on cached responses held at once.
pub const DEFAULT_MAX_ENTRIES: u64 = 512;

/// Pluggable caching strategy injected into [`crate::UpstreamClient`].
#[async_trait]
pub trait CachePolicy: Send + Sync {
    /// Return a fresh cached payload for `key`, if any.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Remember a successful payload.
    async fn put(&self, key: &str, value: Value);
}

/// Never caches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl CachePolicy for NoCache {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn put(&self, _key: &str, _value: Value) {}
}

/// Time-bounded in-memory cache.
#[derive(Clone)]
pub struct TtlCache {
    entries: moka::future::Cache<String, Value>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Cache holding at most `max_entries` responses.
    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(ttl)
            .build();
        Self { entries, ttl }
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl CachePolicy for TtlCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let hit = self.entries.get(key).await;
        if hit.is_some() {
            debug!(key, "upstream cache hit");
        }
        hit
    }

    async fn put(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value).await;
    }
}
