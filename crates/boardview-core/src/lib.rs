//! Boardview core
//!
//! The proxy service that maps dashboard operations onto the remote
//! platform, the shared model catalog cache, the TTL caches behind the
//! dashboard counts, and the error taxonomy used by the server.

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod service;
pub mod stats;

pub use cache::{
    CACHE_HOLDER_NAME, CacheSweeper, DEFAULT_TTL_SECS, LocalTtlCache, LocalTtlStore,
    RemoteMemoryCache, TtlCache,
};
pub use catalog::{CATALOG_TTL_SECS, ModelCatalogCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, ServiceError};
pub use service::{ProxyService, SEARCH_ALL_DEFAULT_LIMIT};
pub use stats::{CountReport, DashboardStats};
