//! Cache-aside facade shared by the endpoint handlers.
//!
//! Values are stored as JSON payloads so a hit serializes to exactly the same
//! bytes as the response that populated it. Entries expire a fixed TTL after
//! insertion and are replaced wholesale on refresh.
//!
//! Concurrent misses for one key are coalesced by moka's `try_get_with`: the
//! first caller runs the producer, the others wait for its outcome. A failed
//! producer leaves the slot empty.

use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Resource families that share the cache key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Weather,
    City,
    Image,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Weather => "weather",
            ResourceKind::City => "city",
            ResourceKind::Image => "image",
        }
    }
}

/// Builds `"{kind}_{city}_{country}"`, with `default` standing in for a
/// missing country. City is lower-cased and country upper-cased so that
/// `london`/`London ` and `gb`/`GB` share an entry.
pub fn cache_key(kind: ResourceKind, city: &str, country: Option<&str>) -> String {
    let city = city.trim().to_lowercase();
    let country = country
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "default".to_string());
    format!("{}_{}_{}", kind.as_str(), city, country)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: u64,
    pub ttl_seconds: u64,
    pub max_capacity: u64,
}

pub struct ResponseCache {
    inner: Cache<String, Value>,
    ttl: Duration,
    max_capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            inner,
            ttl,
            max_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the live entry for `key`, or runs `producer`, stores its
    /// result and returns it. Producer errors propagate and are not cached.
    pub async fn get_or_compute<F, E>(&self, key: &str, producer: F) -> Result<Value, E>
    where
        F: Future<Output = Result<Value, E>>,
        E: Clone + Send + Sync + 'static,
    {
        let computed = AtomicBool::new(false);

        let result = self
            .inner
            .try_get_with(key.to_string(), async {
                computed.store(true, Ordering::Relaxed);
                tracing::debug!("Cache miss, fetching upstream for: {}", key);
                producer.await
            })
            .await;

        if computed.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else if result.is_ok() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit for: {}", key);
        }

        result.map_err(|e| {
            tracing::error!("Upstream error for {}", key);
            Arc::unwrap_or_clone(e)
        })
    }

    /// Drops one entry. Returns whether a live entry existed.
    pub async fn remove(&self, key: &str) -> bool {
        let existed = self.inner.contains_key(key);
        self.inner.invalidate(key).await;
        existed
    }

    /// Drops every entry and returns how many live keys were cleared.
    pub async fn clear(&self) -> u64 {
        let keys = self.keys();
        tracing::debug!("Clearing cache keys: {:?}", keys);
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        keys.len() as u64
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn key_count(&self) -> u64 {
        self.inner.iter().count() as u64
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys: self.key_count(),
            ttl_seconds: self.ttl.as_secs(),
            max_capacity: self.max_capacity,
        }
    }
}
