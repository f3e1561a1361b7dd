//! Proxy service: normalized operations mapped onto the remote platform.
//!
//! Each operation validates its input, calls the remote client bound to the
//! session's API key and reshapes the payload into records. Listings drop
//! unreadable items; single-entity reads fail when the payload is unusable.

mod assistants;
mod documents;
mod memory;
mod models;
mod threads;

use std::sync::Arc;

use boardview_models::DecodeResult;
use boardview_remote::{RemoteClient, RemoteConnector, RemoteError};
use serde_json::Value;

use crate::catalog::ModelCatalogCache;
use crate::error::{Result, ServiceError};

pub use memory::SEARCH_ALL_DEFAULT_LIMIT;
pub use threads::THREAD_LISTING_LIMIT;

/// Upper bound used whenever "all assistants" are needed.
pub const ASSISTANT_LISTING_LIMIT: usize = 10_000;

#[derive(Clone)]
pub struct ProxyService {
    client: Arc<dyn RemoteClient>,
    catalog: Arc<ModelCatalogCache>,
}

impl ProxyService {
    pub fn new(client: Arc<dyn RemoteClient>, catalog: Arc<ModelCatalogCache>) -> Self {
        Self { client, catalog }
    }

    /// Bind a service to `api_key`, failing with `Authentication` when the
    /// key is missing or blank.
    pub fn connect(
        connector: &dyn RemoteConnector,
        api_key: Option<&str>,
        catalog: Arc<ModelCatalogCache>,
    ) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ServiceError::Authentication("API key not found in session".into()))?;
        Ok(Self::new(connector.connect(api_key), catalog))
    }

    pub fn client(&self) -> &dyn RemoteClient {
        self.client.as_ref()
    }
}

/// Decode a single-entity payload, turning a decode issue into a remote
/// format error.
fn decode_one<T>(raw: &Value, decode: fn(&Value) -> DecodeResult<T>) -> Result<T> {
    decode(raw).map_err(|issue| ServiceError::Remote(RemoteError::InvalidFormat(issue.to_string())))
}

#[cfg(test)]
pub(crate) fn test_service(
    platform: &boardview_remote::InMemoryPlatform,
    api_key: &str,
) -> ProxyService {
    ProxyService::connect(
        platform,
        Some(api_key),
        Arc::new(ModelCatalogCache::with_defaults()),
    )
    .unwrap()
}
