//! Model catalog cache.
//!
//! The catalog is the same for every API key, so one instance is shared by
//! all sessions. Refreshes are single-flight: callers that queued behind a
//! refresh re-check freshness before fetching again.

use std::sync::Arc;

use boardview_models::ModelInfo;
use boardview_remote::{MODEL_PAGE_SIZE, PageRequest, RemoteClient};
use futures::{StreamExt, stream};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

/// Seconds a fetched catalog stays fresh.
pub const CATALOG_TTL_SECS: u64 = 3600;

/// Maximum catalog pages requested at once.
pub const PAGE_CONCURRENCY: usize = 10;

struct Snapshot {
    models: Vec<ModelInfo>,
    fetched_at: i64,
}

pub struct ModelCatalogCache {
    clock: Arc<dyn Clock>,
    ttl: u64,
    snapshot: RwLock<Option<Snapshot>>,
    refresh: Mutex<()>,
}

impl ModelCatalogCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: u64) -> Self {
        Self {
            clock,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Cache on the system clock with the default TTL.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SystemClock), CATALOG_TTL_SECS)
    }

    /// Return the catalog, fetching it through `client` when the snapshot
    /// is missing or stale. An empty result is returned but never kept.
    pub async fn models(&self, client: &dyn RemoteClient) -> Vec<ModelInfo> {
        if let Some(models) = self.fresh() {
            return models;
        }

        let _guard = self.refresh.lock().await;
        if let Some(models) = self.fresh() {
            debug!("Model catalog refreshed by a concurrent caller");
            return models;
        }

        let fetched_at = self.clock.now_secs();
        let models = fetch_catalog(client).await;
        if !models.is_empty() {
            info!(count = models.len(), "Model catalog refreshed");
            *self.snapshot.write() = Some(Snapshot {
                models: models.clone(),
                fetched_at,
            });
        }
        models
    }

    /// Drop the snapshot so the next read fetches again.
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }

    fn fresh(&self) -> Option<Vec<ModelInfo>> {
        let now = self.clock.now_secs();
        let snapshot = self.snapshot.read();
        snapshot
            .as_ref()
            .filter(|snapshot| now - snapshot.fetched_at < self.ttl as i64)
            .map(|snapshot| snapshot.models.clone())
    }
}

async fn fetch_catalog(client: &dyn RemoteClient) -> Vec<ModelInfo> {
    let first = match client.list_models(None).await {
        Ok(page) => page,
        Err(err) => {
            warn!(error = %err, "Failed to fetch model catalog");
            return Vec::new();
        }
    };

    let mut raw = first.models;
    if first.total > MODEL_PAGE_SIZE {
        let skips = (MODEL_PAGE_SIZE..first.total).step_by(MODEL_PAGE_SIZE);
        let pages: Vec<Vec<Value>> = stream::iter(skips)
            .map(|skip| async move {
                let page = PageRequest {
                    skip,
                    limit: MODEL_PAGE_SIZE,
                };
                match client.list_models(Some(page)).await {
                    Ok(page) => page.models,
                    Err(err) => {
                        warn!(skip, error = %err, "Skipping model catalog page");
                        Vec::new()
                    }
                }
            })
            .buffer_unordered(PAGE_CONCURRENCY)
            .collect()
            .await;
        raw.extend(pages.into_iter().flatten());
    }

    raw.iter()
        .filter_map(|item| match ModelInfo::decode(item) {
            Ok(model) => Some(model),
            Err(issue) => {
                debug!(%issue, "Dropping unreadable catalog item");
                None
            }
        })
        .collect()
}
