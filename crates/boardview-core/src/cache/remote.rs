//! Cache entries stored as memories of a reserved holder assistant.
//!
//! Entries written by earlier deployments use the same layout: metadata
//! `{cache_key, cache_time, ttl}`, tags `["cache", key]`, and the value as
//! JSON text (plain strings are stored raw).

use std::sync::Arc;

use async_trait::async_trait;
use boardview_models::{AssistantCreate, Memory, MemoryCreate, Metadata, integer_of};
use boardview_remote::RemoteError;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{CACHE_HOLDER_NAME, DEFAULT_TTL_SECS, TtlCache, is_expired};
use crate::clock::Clock;
use crate::error::{Result, ServiceError};
use crate::service::{ASSISTANT_LISTING_LIMIT, ProxyService};

const HOLDER_SYSTEM_PROMPT: &str = "Cache storage for bb_browser application";

pub struct RemoteMemoryCache {
    service: ProxyService,
    clock: Arc<dyn Clock>,
    default_ttl: u64,
    holder: OnceCell<String>,
}

/// Cache bookkeeping read from a memory's metadata.
struct EntryMeta<'a> {
    memory_id: Option<&'a str>,
    cache_key: &'a str,
    cache_time: i64,
    ttl: u64,
}

impl<'a> EntryMeta<'a> {
    fn read(memory: &'a Memory, default_ttl: u64) -> Option<Self> {
        let cache_key = memory.meta("cache_key")?.as_str()?;
        let cache_time = memory.meta("cache_time").and_then(integer_of).unwrap_or(0);
        let ttl = memory
            .meta("ttl")
            .and_then(integer_of)
            .and_then(|ttl| u64::try_from(ttl).ok())
            .unwrap_or(default_ttl);
        Some(Self {
            memory_id: memory.id.as_deref(),
            cache_key,
            cache_time,
            ttl,
        })
    }
}

impl RemoteMemoryCache {
    pub fn new(service: ProxyService, clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(service, clock, DEFAULT_TTL_SECS)
    }

    pub fn with_default_ttl(
        service: ProxyService,
        clock: Arc<dyn Clock>,
        default_ttl: u64,
    ) -> Self {
        Self {
            service,
            clock,
            default_ttl,
            holder: OnceCell::new(),
        }
    }

    /// Id of the holder assistant, created on first use.
    async fn holder_id(&self) -> Result<&str> {
        self.holder
            .get_or_try_init(|| self.resolve_holder())
            .await
            .map(String::as_str)
    }

    async fn resolve_holder(&self) -> Result<String> {
        let assistants = self.service.list_assistants(0, ASSISTANT_LISTING_LIMIT).await?;
        if let Some(id) = assistants
            .into_iter()
            .filter(|assistant| assistant.name == CACHE_HOLDER_NAME)
            .find_map(|assistant| assistant.id)
        {
            return Ok(id);
        }

        let request =
            AssistantCreate::new(CACHE_HOLDER_NAME).with_system_prompt(HOLDER_SYSTEM_PROMPT);
        let created = self.service.create_assistant(&request).await?;
        let id = created.id.ok_or_else(|| {
            ServiceError::Remote(RemoteError::InvalidFormat(
                "cache holder was created without an id".to_string(),
            ))
        })?;
        info!(holder_id = %id, "Created cache holder assistant");
        Ok(id)
    }

    async fn entries(&self) -> Result<(String, Vec<Memory>)> {
        let holder = self.holder_id().await?.to_string();
        let memories = self.service.list_memories(&holder).await?;
        Ok((holder, memories))
    }

    /// Delete the given memories, returning how many deletions succeeded.
    async fn delete_memories<'a>(
        &self,
        holder: &str,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        let mut deleted = 0;
        for memory_id in ids {
            match self.service.delete_memory(holder, memory_id).await {
                Ok(()) => deleted += 1,
                Err(err) => warn!(memory_id, error = %err, "Failed to delete cache entry"),
            }
        }
        deleted
    }

    /// First valid entry for `key`. Expired entries met on the way are
    /// deleted; later duplicates are left alone.
    async fn try_get(&self, key: &str) -> Result<Option<Value>> {
        let (holder, memories) = self.entries().await?;
        let now = self.clock.now_secs();

        let mut stale = Vec::new();
        let mut found = None;
        for memory in &memories {
            let Some(entry) = EntryMeta::read(memory, self.default_ttl) else {
                continue;
            };
            if entry.cache_key != key {
                continue;
            }
            if is_expired(entry.cache_time, entry.ttl, now) {
                debug!(key, age = now - entry.cache_time, "Cache entry expired");
                stale.extend(entry.memory_id);
                continue;
            }
            found = Some(decode_payload(&memory.content));
            break;
        }

        if !stale.is_empty() {
            self.delete_memories(&holder, stale).await;
        }
        Ok(found)
    }

    async fn try_set(&self, key: &str, value: &Value, ttl: u64) -> Result<()> {
        let holder = self.holder_id().await?.to_string();

        let mut metadata = Metadata::new();
        metadata.insert("cache_key".to_string(), json!(key));
        metadata.insert("cache_time".to_string(), json!(self.clock.now_secs()));
        metadata.insert("ttl".to_string(), json!(ttl));

        let request = MemoryCreate::new(encode_payload(value))
            .with_metadata(metadata)
            .with_tags(vec!["cache".to_string(), key.to_string()]);
        self.service.store_memory(&holder, &request).await?;
        Ok(())
    }

    async fn try_delete(&self, key: &str) -> Result<usize> {
        let (holder, memories) = self.entries().await?;
        let ids = matching_ids(&memories, key, self.default_ttl);
        Ok(self.delete_memories(&holder, ids).await)
    }

    async fn try_clear_expired(&self) -> Result<usize> {
        let (holder, memories) = self.entries().await?;
        let now = self.clock.now_secs();
        let expired: Vec<&str> = memories
            .iter()
            .filter_map(|memory| EntryMeta::read(memory, self.default_ttl))
            .filter(|entry| is_expired(entry.cache_time, entry.ttl, now))
            .filter_map(|entry| entry.memory_id)
            .collect();
        Ok(self.delete_memories(&holder, expired).await)
    }
}

fn matching_ids<'a>(memories: &'a [Memory], key: &'a str, default_ttl: u64) -> Vec<&'a str> {
    memories
        .iter()
        .filter_map(|memory| EntryMeta::read(memory, default_ttl))
        .filter(|entry| entry.cache_key == key)
        .filter_map(|entry| entry.memory_id)
        .collect()
}

fn encode_payload(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn decode_payload(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()))
}

#[async_trait]
impl TtlCache for RemoteMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "Cache get failed");
                None
            }
        }
    }

    /// Stores even when clearing the previous entries fails; readers
    /// tolerate the duplicate.
    async fn set(&self, key: &str, value: &Value, ttl: Option<u64>) -> bool {
        self.delete(key).await;
        match self.try_set(key, value, ttl.unwrap_or(self.default_ttl)).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "Cache set failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => {
                debug!(key, removed, "Cache entries deleted");
                true
            }
            Err(err) => {
                warn!(key, error = %err, "Cache delete failed");
                false
            }
        }
    }

    async fn clear_expired(&self) -> usize {
        match self.try_clear_expired().await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "Cache sweep failed");
                0
            }
        }
    }
}
