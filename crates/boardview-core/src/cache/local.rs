//! Process-local cache backend.
//!
//! One [`LocalTtlStore`] is shared by the whole server. Each API key gets its
//! own scope, named by a SHA-256 fingerprint so raw keys are never kept as
//! map keys. Writes are atomic upserts, so concurrent `set`s on one key
//! leave exactly one entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{DEFAULT_TTL_SECS, TtlCache, is_expired};
use crate::clock::Clock;

#[derive(Debug, Clone)]
struct LocalEntry {
    value: Value,
    cache_time: i64,
    ttl: u64,
}

pub struct LocalTtlStore {
    entries: DashMap<(String, String), LocalEntry>,
    clock: Arc<dyn Clock>,
    default_ttl: u64,
}

impl LocalTtlStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(clock, DEFAULT_TTL_SECS)
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>, default_ttl: u64) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            default_ttl,
        }
    }

    /// Scope name for `api_key`.
    pub fn scope_for(api_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(api_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Cache view bound to the scope of `api_key`.
    pub fn cache_for(self: &Arc<Self>, api_key: &str) -> LocalTtlCache {
        LocalTtlCache {
            store: Arc::clone(self),
            scope: Self::scope_for(api_key),
        }
    }

    /// Number of stored entries across all scopes, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, scope: &str, key: &str) -> Option<Value> {
        let id = (scope.to_string(), key.to_string());
        let now = self.clock.now_secs();
        let fresh = self
            .entries
            .get(&id)
            .filter(|entry| !is_expired(entry.cache_time, entry.ttl, now))
            .map(|entry| entry.value.clone());
        if fresh.is_none() {
            self.entries
                .remove_if(&id, |_, entry| is_expired(entry.cache_time, entry.ttl, now));
        }
        fresh
    }

    fn set(&self, scope: &str, key: &str, value: &Value, ttl: Option<u64>) {
        let entry = LocalEntry {
            value: value.clone(),
            cache_time: self.clock.now_secs(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.entries.insert((scope.to_string(), key.to_string()), entry);
    }

    fn delete(&self, scope: &str, key: &str) {
        self.entries.remove(&(scope.to_string(), key.to_string()));
    }

    /// Remove expired entries, limited to `scope` when given.
    fn clear_expired(&self, scope: Option<&str>) -> usize {
        let now = self.clock.now_secs();
        let before = self.entries.len();
        self.entries.retain(|(entry_scope, _), entry| {
            let in_scope = scope.is_none_or(|scope| scope == entry_scope);
            !(in_scope && is_expired(entry.cache_time, entry.ttl, now))
        });
        before.saturating_sub(self.entries.len())
    }

    /// Sweep expired entries of every scope every `every` until the
    /// returned handle is stopped or dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> CacheSweeper {
        let cancel = CancellationToken::new();
        let store = Arc::clone(self);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            info!(interval_secs = every.as_secs(), "Cache sweeper started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.clear_expired(None);
                        if removed > 0 {
                            debug!(removed, "Swept expired cache entries");
                        }
                    }
                }
            }
            debug!("Cache sweeper stopped");
        });

        CacheSweeper { cancel, handle }
    }
}

/// Handle to the background sweep task.
pub struct CacheSweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(err) = (&mut self.handle).await {
            debug!(error = %err, "Cache sweeper ended abnormally");
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// [`TtlCache`] view of one scope of a [`LocalTtlStore`].
#[derive(Clone)]
pub struct LocalTtlCache {
    store: Arc<LocalTtlStore>,
    scope: String,
}

#[async_trait]
impl TtlCache for LocalTtlCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.store.get(&self.scope, key)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Option<u64>) -> bool {
        self.store.set(&self.scope, key, value, ttl);
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.store.delete(&self.scope, key);
        true
    }

    async fn clear_expired(&self) -> usize {
        self.store.clear_expired(Some(&self.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn store_at(start: i64) -> (Arc<LocalTtlStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        (Arc::new(LocalTtlStore::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_round_trip_and_expiry() {
        let (store, clock) = store_at(1_000);
        let cache = store.cache_for("key");
        let value = json!({"count": 42, "providers": 5});

        assert!(cache.set("models_count_data", &value, Some(3600)).await);
        assert_eq!(cache.get("models_count_data").await, Some(value));

        clock.advance(3601);
        assert_eq!(cache.get("models_count_data").await, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let (store, _) = store_at(0);
        let alice = store.cache_for("alice");
        let bob = store.cache_for("bob");

        alice.set("k", &json!(1), None).await;

        assert_eq!(bob.get("k").await, None);
        assert_eq!(alice.get("k").await, Some(json!(1)));
        assert_ne!(LocalTtlStore::scope_for("alice"), "alice");
        assert_eq!(LocalTtlStore::scope_for("alice").len(), 64);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _) = store_at(0);
        let cache = store.cache_for("key");

        cache.set("k", &json!("v"), None).await;
        assert!(cache.delete("k").await);
        assert!(cache.delete("k").await);
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_clear_expired_counts_only_own_scope() {
        let (store, clock) = store_at(0);
        let cache = store.cache_for("key");
        let other = store.cache_for("other");

        cache.set("short", &json!(1), Some(10)).await;
        cache.set("exact", &json!(2), Some(100)).await;
        cache.set("long", &json!(3), Some(1_000)).await;
        other.set("short", &json!(4), Some(10)).await;
        clock.advance(100);

        assert_eq!(cache.clear_expired().await, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(other.clear_expired().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sets_leave_one_entry() {
        let (store, _) = store_at(0);
        let cache = store.cache_for("key");

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set("k", &json!("v1"), None).await })
        };
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set("k", &json!("v2"), None).await })
        };
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());

        let value = cache.get("k").await.unwrap();
        assert!(value == json!("v1") || value == json!("v2"));
        assert_eq!(store.len(), 1);

        cache.delete("k").await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_clears_all_scopes() {
        let (store, clock) = store_at(0);
        store.cache_for("a").set("k", &json!(1), Some(5)).await;
        store.cache_for("b").set("k", &json!(2), Some(5)).await;
        clock.advance(10);

        let sweeper = store.spawn_sweeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.is_empty());
        sweeper.stop().await;
    }
}
