use boardview_models::{AnnotatedMemory, Memory, MemoryCreate, MemorySearch, decode_memories};
use tracing::{debug, warn};

use super::{ASSISTANT_LISTING_LIMIT, ProxyService, decode_one};
use crate::cache::CACHE_HOLDER_NAME;
use crate::error::{Result, ServiceError, require};

/// Hits returned by the cross-assistant search when no limit is given.
pub const SEARCH_ALL_DEFAULT_LIMIT: usize = 50;

impl ProxyService {
    pub async fn list_memories(&self, assistant_id: &str) -> Result<Vec<Memory>> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let raw = self.client.list_memories(assistant_id).await?;
        Ok(decode_memories(&raw))
    }

    pub async fn get_memory(&self, assistant_id: &str, memory_id: &str) -> Result<Memory> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let memory_id = require(Some(memory_id), "memory_id")?;
        let raw = self.client.get_memory(assistant_id, memory_id).await?;
        decode_one(&raw, Memory::decode)
    }

    /// Store a memory. The platform answers with the new id only, so the
    /// returned record echoes the request.
    pub async fn store_memory(
        &self,
        assistant_id: &str,
        request: &MemoryCreate,
    ) -> Result<Memory> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        if request.content.trim().is_empty() {
            return Err(ServiceError::missing_field("content"));
        }

        let raw = self
            .client
            .add_memory(assistant_id, &request.content, request.metadata.as_ref())
            .await?;
        let id = Memory::decode(&raw).ok().and_then(|memory| memory.id);
        debug!(assistant_id, memory_id = ?id, "Stored memory");

        Ok(Memory {
            id,
            content: request.content.clone(),
            metadata: request.metadata.clone(),
            tags: request.tags.clone(),
            created_at: None,
            updated_at: None,
        })
    }

    pub async fn delete_memory(&self, assistant_id: &str, memory_id: &str) -> Result<()> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let memory_id = require(Some(memory_id), "memory_id")?;
        self.client.delete_memory(assistant_id, memory_id).await?;
        Ok(())
    }

    /// Filter the assistant's memories by a case-insensitive substring and,
    /// when given, by any of the requested tags.
    pub async fn search_memory(
        &self,
        assistant_id: &str,
        search: &MemorySearch,
    ) -> Result<Vec<Memory>> {
        let memories = self.list_memories(assistant_id).await?;
        let query = search.query.to_lowercase();
        let tags = search.tags.as_deref().unwrap_or_default();

        Ok(memories
            .into_iter()
            .filter(|memory| query.is_empty() || memory.matches_query(&query))
            .filter(|memory| memory.has_any_tag(tags))
            .take(search.effective_limit())
            .collect())
    }

    /// Search every assistant except the cache holder, one at a time, and
    /// stop once `limit` hits are collected. Assistants whose memories
    /// cannot be listed are skipped.
    pub async fn search_all_memories(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AnnotatedMemory>> {
        let query = query.to_lowercase();
        let assistants = self.list_assistants(0, ASSISTANT_LISTING_LIMIT).await?;
        let mut hits = Vec::new();

        for assistant in assistants {
            if hits.len() >= limit {
                break;
            }
            if assistant.name == CACHE_HOLDER_NAME {
                continue;
            }
            let Some(assistant_id) = assistant.id.clone() else {
                continue;
            };

            let memories = match self.list_memories(&assistant_id).await {
                Ok(memories) => memories,
                Err(err) => {
                    warn!(
                        assistant_id = %assistant_id,
                        error = %err,
                        "Skipping assistant in memory search"
                    );
                    continue;
                }
            };

            let remaining = limit - hits.len();
            hits.extend(
                memories
                    .into_iter()
                    .filter(|memory| memory.matches_query(&query))
                    .take(remaining)
                    .map(|memory| AnnotatedMemory {
                        memory,
                        assistant_id: Some(assistant_id.clone()),
                        assistant_name: assistant.name.clone(),
                    }),
            );
        }

        Ok(hits)
    }
}
