//! Assistant records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{
    DecodeResult, Metadata, as_object, first_string, metadata, opaque_id, optional_timestamp,
    required_string,
};

/// An assistant as exposed to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assistant {
    pub id: Option<String>,
    pub name: String,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub metadata: Option<Metadata>,
}

impl Assistant {
    /// Decode an upstream assistant payload.
    ///
    /// The platform reports the id as `assistant_id`; older payloads use
    /// `id`. Only `name` is required.
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "assistant")?;
        Ok(Self {
            id: opaque_id(obj, &["assistant_id", "id"]),
            name: required_string(obj, &["name"], "assistant", "name")?,
            model: first_string(obj, &["model", "model_name", "llm_model"]),
            system_prompt: first_string(obj, &["system_prompt", "description"]),
            created_at: optional_timestamp(obj, &["created_at"]),
            updated_at: optional_timestamp(obj, &["updated_at"]),
            metadata: metadata(obj, "metadata"),
        })
    }
}

/// Decode a listing. Items that fail even lenient decoding are dropped.
pub fn decode_assistants(items: &[Value]) -> Vec<Assistant> {
    items
        .iter()
        .filter_map(|item| match Assistant::decode(item) {
            Ok(assistant) => Some(assistant),
            Err(issue) => {
                tracing::warn!(%issue, "Dropping unreadable assistant");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssistantCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl AssistantCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssistantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}
