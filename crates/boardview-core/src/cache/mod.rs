//! TTL caches for dashboard aggregates.
//!
//! Entries move from absent to valid to expired and back to absent; an entry
//! is expired once `now - cache_time >= ttl`. Cache operations never fail:
//! errors are logged and read as a miss, `false`, or zero.

mod local;
mod remote;

use async_trait::async_trait;
use serde_json::Value;

pub use local::{CacheSweeper, LocalTtlCache, LocalTtlStore};
pub use remote::RemoteMemoryCache;

/// TTL applied when `set` is called without one.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Name of the assistant whose memories hold remote cache entries.
pub const CACHE_HOLDER_NAME: &str = "bb_browser_cache";

#[async_trait]
pub trait TtlCache: Send + Sync {
    /// Valid value under `key`. Expired entries are removed on the way.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Replace the value under `key`. `None` uses the default TTL.
    async fn set(&self, key: &str, value: &Value, ttl: Option<u64>) -> bool;

    /// Remove every entry under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> bool;

    /// Remove all expired entries and return how many were removed.
    async fn clear_expired(&self) -> usize;
}

pub(crate) fn is_expired(cache_time: i64, ttl: u64, now: i64) -> bool {
    now.saturating_sub(cache_time) >= i64::try_from(ttl).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        assert!(!is_expired(1_000, 3600, 4_599));
        assert!(is_expired(1_000, 3600, 4_600));
        assert!(is_expired(0, 3600, 1_700_000_000));
        assert!(is_expired(50, 0, 50));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        assert!(!is_expired(0, u64::MAX, 1_700_000_000));
        assert!(!is_expired(0, u64::MAX, i64::MAX - 1));
    }
}
