//! Memory records and memory inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{
    DecodeResult, Metadata, as_object, metadata, opaque_id, optional_timestamp, string_list,
    text_of,
};

/// A memory stored under an assistant. `content` may hold a JSON-encoded
/// cache payload when the memory belongs to the cache holder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    pub id: Option<String>,
    pub content: String,
    pub metadata: Option<Metadata>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Memory {
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "memory")?;
        Ok(Self {
            id: opaque_id(obj, &["memory_id", "id"]),
            content: obj.get("content").map(text_of).unwrap_or_default(),
            metadata: metadata(obj, "metadata"),
            tags: string_list(obj, "tags"),
            created_at: optional_timestamp(obj, &["created_at"]),
            updated_at: optional_timestamp(obj, &["updated_at"]),
        })
    }

    /// Metadata value under `key`, if any.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref()?.get(key)
    }

    /// Case-insensitive substring match on the content.
    pub fn matches_query(&self, query_lower: &str) -> bool {
        self.content.to_lowercase().contains(query_lower)
    }

    /// True when no tag filter is given or the memory carries one of `tags`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        if tags.is_empty() {
            return true;
        }
        self.tags
            .as_ref()
            .is_some_and(|own| own.iter().any(|tag| tags.contains(tag)))
    }
}

/// Decode a listing, dropping items that are not objects.
pub fn decode_memories(items: &[Value]) -> Vec<Memory> {
    items
        .iter()
        .filter_map(|item| match Memory::decode(item) {
            Ok(memory) => Some(memory),
            Err(issue) => {
                tracing::warn!(%issue, "Dropping unreadable memory");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryCreate {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MemoryCreate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemorySearch {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

fn default_search_limit() -> Option<usize> {
    Some(DEFAULT_SEARCH_LIMIT)
}

impl MemorySearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_search_limit(),
            tags: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}

/// A hit from the cross-assistant search, annotated with its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedMemory {
    #[serde(flatten)]
    pub memory: Memory,
    pub assistant_id: Option<String>,
    pub assistant_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_memory() {
        let raw = json!({
            "id": "m-1",
            "content": "{\"count\": 4}",
            "metadata": {"cache_key": "assistants_count_total", "cache_time": 10, "ttl": 3600},
            "score": 0.4
        });

        let memory = Memory::decode(&raw).unwrap();
        assert_eq!(memory.id.as_deref(), Some("m-1"));
        assert_eq!(memory.meta("cache_key"), Some(&json!("assistants_count_total")));
        assert!(memory.tags.is_none());
    }

    #[test]
    fn test_decode_memory_without_content() {
        let memory = Memory::decode(&json!({"memory_id": "m-2"})).unwrap();
        assert_eq!(memory.id.as_deref(), Some("m-2"));
        assert_eq!(memory.content, "");
        assert!(memory.meta("cache_key").is_none());
    }

    #[test]
    fn test_query_and_tag_filters() {
        let memory = Memory::decode(&json!({
            "id": "m",
            "content": "Prefers Rust over Go",
            "tags": ["lang"]
        }))
        .unwrap();

        assert!(memory.matches_query("rust"));
        assert!(!memory.matches_query("python"));
        assert!(memory.has_any_tag(&[]));
        assert!(memory.has_any_tag(&["lang".to_string()]));
        assert!(!memory.has_any_tag(&["food".to_string()]));
    }

    #[test]
    fn test_search_defaults() {
        let search: MemorySearch = serde_json::from_value(json!({"query": "x"})).unwrap();
        assert_eq!(search.effective_limit(), 10);

        let search: MemorySearch =
            serde_json::from_value(json!({"query": "x", "limit": null})).unwrap();
        assert_eq!(search.effective_limit(), 10);
    }

    #[test]
    fn test_annotated_memory_flattens() {
        let hit = AnnotatedMemory {
            memory: Memory::decode(&json!({"id": "m", "content": "c"})).unwrap(),
            assistant_id: Some("a".to_string()),
            assistant_name: "Alpha".to_string(),
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["id"], "m");
        assert_eq!(value["assistant_name"], "Alpha");
    }
}
