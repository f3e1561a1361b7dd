//! Dashboard counts, cached for an hour.
//!
//! Memory and document totals need one request per assistant; those run
//! with bounded concurrency and a failing assistant counts as zero.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use boardview_models::integer_of;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::error::{Result, ServiceError};
use crate::service::{ASSISTANT_LISTING_LIMIT, ProxyService};

pub const ASSISTANTS_COUNT_KEY: &str = "assistants_count_total";
pub const MEMORY_COUNT_KEY: &str = "memory_count_total";
pub const THREADS_COUNT_KEY: &str = "threads_count_total";
pub const DOCUMENTS_COUNT_KEY: &str = "documents_count_total";
pub const MODELS_COUNT_KEY: &str = "models_count_data";

pub const COUNT_TTL_SECS: u64 = 3600;

/// Per-assistant requests in flight while counting.
pub const FANOUT_CONCURRENCY: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountReport {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<u64>,
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelsCount {
    count: u64,
    #[serde(default)]
    providers: u64,
}

pub struct DashboardStats {
    service: ProxyService,
    cache: Arc<dyn TtlCache>,
}

impl DashboardStats {
    pub fn new(service: ProxyService, cache: Arc<dyn TtlCache>) -> Self {
        Self { service, cache }
    }

    pub async fn count_assistants(&self) -> Result<CountReport> {
        self.cached_count(ASSISTANTS_COUNT_KEY, || self.total_assistants()).await
    }

    pub async fn count_memories(&self) -> Result<CountReport> {
        self.cached_count(MEMORY_COUNT_KEY, || self.total_memories()).await
    }

    pub async fn count_threads(&self) -> Result<CountReport> {
        self.cached_count(THREADS_COUNT_KEY, || self.total_threads()).await
    }

    pub async fn count_documents(&self) -> Result<CountReport> {
        self.cached_count(DOCUMENTS_COUNT_KEY, || self.total_documents()).await
    }

    /// Catalog size and number of distinct providers.
    pub async fn count_models(&self) -> Result<CountReport> {
        if let Some(cached) = self.cache.get(MODELS_COUNT_KEY).await {
            match serde_json::from_value::<ModelsCount>(cached) {
                Ok(data) => {
                    return Ok(CountReport {
                        count: data.count,
                        providers: Some(data.providers),
                        cached: true,
                    });
                }
                Err(err) => debug!(error = %err, "Ignoring unreadable cached model count"),
            }
        }

        let models = self.service.list_models().await;
        let providers: HashSet<&str> = models
            .iter()
            .filter_map(|model| model.provider.as_deref())
            .filter(|provider| !provider.is_empty())
            .collect();
        let data = ModelsCount {
            count: models.len() as u64,
            providers: providers.len() as u64,
        };

        self.cache
            .set(MODELS_COUNT_KEY, &json!(data), Some(COUNT_TTL_SECS))
            .await;
        Ok(CountReport {
            count: data.count,
            providers: Some(data.providers),
            cached: false,
        })
    }

    async fn cached_count<F, Fut>(&self, key: &str, compute: F) -> Result<CountReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        if let Some(cached) = self.cache.get(key).await {
            match cached_integer(&cached) {
                Some(count) => {
                    return Ok(CountReport {
                        count,
                        providers: None,
                        cached: true,
                    });
                }
                None => debug!(key, "Ignoring unreadable cached count"),
            }
        }

        let count = compute().await?;
        self.cache.set(key, &json!(count), Some(COUNT_TTL_SECS)).await;
        Ok(CountReport {
            count,
            providers: None,
            cached: false,
        })
    }

    async fn total_assistants(&self) -> Result<u64> {
        Ok(self.assistant_ids().await?.len() as u64)
    }

    async fn total_threads(&self) -> Result<u64> {
        Ok(self.service.list_threads().await?.len() as u64)
    }

    async fn total_memories(&self) -> Result<u64> {
        let ids = self.assistant_ids().await?;
        Ok(self
            .fan_out(ids, |assistant_id| async move {
                self.service
                    .list_memories(&assistant_id)
                    .await
                    .map(|memories| memories.len())
                    .map_err(|err| (assistant_id, err))
            })
            .await)
    }

    async fn total_documents(&self) -> Result<u64> {
        let ids = self.assistant_ids().await?;
        Ok(self
            .fan_out(ids, |assistant_id| async move {
                self.service
                    .list_documents(Some(&assistant_id), None)
                    .await
                    .map(|documents| documents.len())
                    .map_err(|err| (assistant_id, err))
            })
            .await)
    }

    async fn assistant_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .service
            .list_assistants(0, ASSISTANT_LISTING_LIMIT)
            .await?
            .into_iter()
            .filter_map(|assistant| assistant.id)
            .collect())
    }

    /// Sum `count_one` over every assistant, at most
    /// [`FANOUT_CONCURRENCY`] at a time.
    async fn fan_out<F, Fut>(&self, assistant_ids: Vec<String>, count_one: F) -> u64
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = std::result::Result<usize, (String, ServiceError)>>,
    {
        stream::iter(assistant_ids)
            .map(count_one)
            .buffer_unordered(FANOUT_CONCURRENCY)
            .fold(0u64, |total, result| async move {
                match result {
                    Ok(count) => total + count as u64,
                    Err((assistant_id, err)) => {
                        warn!(assistant_id = %assistant_id, error = %err, "Counting as zero");
                        total
                    }
                }
            })
            .await
    }
}

fn cached_integer(value: &Value) -> Option<u64> {
    integer_of(value).and_then(|count| u64::try_from(count).ok())
}
