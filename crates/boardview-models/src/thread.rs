//! Thread and message records.
//!
//! Thread payloads are the least consistent upstream shape: message roles
//! include values outside any fixed set (`tool`, numeric codes, `null`), and
//! some threads carry no message list at all. Decoding therefore works item
//! by item and drops only what cannot be read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{
    DecodeResult, Metadata, as_object, first_string, metadata, opaque_id, optional_timestamp,
    parse_timestamp, text_of,
};

pub const DEFAULT_ROLE: &str = "user";

/// One message inside a thread. `role` is free-form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "message")?;
        Ok(Self {
            role: normalize_role(obj.get("role")),
            content: obj.get("content").map(text_of).unwrap_or_default(),
            timestamp: ["timestamp", "created_at"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(parse_timestamp)),
        })
    }
}

/// Any role value becomes a string; a missing or null role means `user`.
pub fn normalize_role(role: Option<&Value>) -> String {
    match role {
        None | Some(Value::Null) => DEFAULT_ROLE.to_string(),
        Some(value) => text_of(value),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: Option<String>,
    pub title: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
}

impl Thread {
    /// Decode an upstream thread payload.
    ///
    /// Unreadable messages are dropped; a missing `messages` field yields an
    /// empty list. Only a non-object payload fails.
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "thread")?;
        let thread_id = opaque_id(obj, &["thread_id", "id"]);

        let messages = match obj.get("messages") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match Message::decode(item) {
                    Ok(message) => Some(message),
                    Err(issue) => {
                        tracing::debug!(
                            thread_id = thread_id.as_deref().unwrap_or("<none>"),
                            %issue,
                            "Dropping unreadable thread message"
                        );
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            id: thread_id,
            title: first_string(obj, &["title", "name"]),
            messages,
            created_at: optional_timestamp(obj, &["created_at"]),
            updated_at: optional_timestamp(obj, &["updated_at"]),
            metadata: metadata(obj, "metadata"),
            assistant_id: opaque_id(obj, &["assistant_id"]),
        })
    }

    /// Whether this thread may belong to `assistant_id`. Threads whose
    /// owner is unknown are kept.
    pub fn belongs_to(&self, assistant_id: &str) -> bool {
        self.assistant_id
            .as_deref()
            .is_none_or(|owner| owner == assistant_id)
    }
}

/// Decode a listing, dropping items that are not objects.
pub fn decode_threads(items: &[Value]) -> Vec<Thread> {
    items
        .iter()
        .filter_map(|item| match Thread::decode(item) {
            Ok(thread) => Some(thread),
            Err(issue) => {
                tracing::warn!(%issue, "Dropping unreadable thread");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThreadCreate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub initial_message: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_defaults_to_user() {
        let message = Message::decode(&json!({"content": "hi"})).unwrap();
        assert_eq!(message.role, "user");

        let message = Message::decode(&json!({"role": null, "content": "hi"})).unwrap();
        assert_eq!(message.role, "user");
    }

    #[test]
    fn test_role_is_stringified() {
        let message = Message::decode(&json!({"role": 123, "content": "hi"})).unwrap();
        assert_eq!(message.role, "123");

        let message = Message::decode(&json!({"role": "tool", "content": "done"})).unwrap();
        assert_eq!(message.role, "tool");
    }

    #[test]
    fn test_content_is_coerced() {
        let message = Message::decode(&json!({"role": "assistant", "content": 5})).unwrap();
        assert_eq!(message.content, "5");

        let message = Message::decode(&json!({"role": "assistant"})).unwrap();
        assert_eq!(message.content, "");
    }

    #[test]
    fn test_thread_drops_unreadable_messages() {
        let raw = json!({
            "thread_id": "t-1",
            "messages": [
                {"role": "user", "content": "question"},
                "garbage",
                {"role": "tool", "content": "result"}
            ]
        });

        let thread = Thread::decode(&raw).unwrap();
        assert_eq!(thread.id.as_deref(), Some("t-1"));
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.messages[1].role, "tool");
    }

    #[test]
    fn test_thread_without_messages_has_empty_list() {
        let thread = Thread::decode(&json!({"thread_id": "t-2", "title": "Empty"})).unwrap();
        assert!(thread.messages.is_empty());
        assert_eq!(thread.title.as_deref(), Some("Empty"));

        let thread = Thread::decode(&json!({"thread_id": "t-3", "messages": "oops"})).unwrap();
        assert!(thread.messages.is_empty());
    }

    #[test]
    fn test_decode_threads_keeps_well_formed_items() {
        let items = vec![
            json!({"thread_id": "a", "messages": [{"role": "user", "content": "x"}]}),
            json!(42),
            json!({"thread_id": "b"}),
            json!({"thread_id": "c", "messages": [null, {"role": 7}]}),
        ];

        let threads = decode_threads(&items);
        let ids: Vec<_> = threads.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(threads[2].messages.len(), 1);
        assert_eq!(threads[2].messages[0].role, "7");
    }

    #[test]
    fn test_belongs_to() {
        let owned = Thread::decode(&json!({"thread_id": "a", "assistant_id": "x"})).unwrap();
        let unknown = Thread::decode(&json!({"thread_id": "b"})).unwrap();
        assert!(owned.belongs_to("x"));
        assert!(!owned.belongs_to("y"));
        assert!(unknown.belongs_to("y"));
    }
}
