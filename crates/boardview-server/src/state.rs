use std::sync::Arc;

use axum::http::HeaderMap;
use boardview_core::{
    Clock, DashboardStats, LocalTtlStore, ModelCatalogCache, ProxyService, RemoteMemoryCache,
    SystemClock, TtlCache,
};
use boardview_remote::{HttpConnector, RemoteConnector};

use crate::config::{CacheBackend, ServerConfig};
use crate::error::ApiResult;
use crate::session::{SessionStore, session_id};

enum CacheStore {
    Remote,
    Local(Arc<LocalTtlStore>),
}

/// Shared by every handler through an `Extension`.
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: SessionStore,
    connector: Arc<dyn RemoteConnector>,
    catalog: Arc<ModelCatalogCache>,
    cache_store: CacheStore,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        connector: Arc<dyn RemoteConnector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = Arc::new(ModelCatalogCache::new(clock.clone(), config.catalog_ttl_secs));
        let cache_store = match config.cache_backend {
            CacheBackend::Remote => CacheStore::Remote,
            CacheBackend::Local => CacheStore::Local(Arc::new(LocalTtlStore::with_default_ttl(
                clock.clone(),
                config.cache_ttl_secs,
            ))),
        };

        Self {
            config,
            sessions: SessionStore::new(),
            connector,
            catalog,
            cache_store,
            clock,
        }
    }

    /// State talking to the configured remote platform over HTTP.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let connector = HttpConnector::new(&config.base_url, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(connector), Arc::new(SystemClock)))
    }

    /// API key for this request: the session's key, else the default key.
    pub fn resolve_api_key(&self, headers: &HeaderMap) -> Option<String> {
        session_id(headers)
            .and_then(|id| self.sessions.api_key(&id))
            .or_else(|| self.config.default_api_key.clone())
    }

    pub fn proxy(&self, api_key: &str) -> ApiResult<ProxyService> {
        Ok(ProxyService::connect(
            self.connector.as_ref(),
            Some(api_key),
            self.catalog.clone(),
        )?)
    }

    pub fn cache(&self, api_key: &str) -> ApiResult<Arc<dyn TtlCache>> {
        Ok(match &self.cache_store {
            CacheStore::Remote => Arc::new(RemoteMemoryCache::with_default_ttl(
                self.proxy(api_key)?,
                self.clock.clone(),
                self.config.cache_ttl_secs,
            )),
            CacheStore::Local(store) => Arc::new(store.cache_for(api_key)),
        })
    }

    pub fn stats(&self, api_key: &str) -> ApiResult<DashboardStats> {
        Ok(DashboardStats::new(self.proxy(api_key)?, self.cache(api_key)?))
    }

    /// The process-local store when that backend is selected.
    pub fn local_store(&self) -> Option<&Arc<LocalTtlStore>> {
        match &self.cache_store {
            CacheStore::Local(store) => Some(store),
            CacheStore::Remote => None,
        }
    }
}
