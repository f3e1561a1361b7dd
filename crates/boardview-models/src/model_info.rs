//! Model catalog entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{
    DecodeResult, as_object, optional_bool, optional_string, optional_u64, required_string,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub description: Option<String>,
    pub max_tokens: Option<u64>,
    pub supports_streaming: Option<bool>,
}

impl ModelInfo {
    /// Decode one catalog item.
    ///
    /// The catalog keys models by `name`, which doubles as the id. The
    /// description is derived from `model_type` and `supports_streaming`
    /// mirrors the catalog's `supports_tools` flag.
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "model")?;
        let name = required_string(obj, &["name"], "model", "name")?;
        let model_type = optional_string(obj, "model_type").unwrap_or_else(|| "llm".to_string());

        Ok(Self {
            id: name.clone(),
            name,
            provider: optional_string(obj, "provider"),
            capabilities: Some(Vec::new()),
            description: Some(format!("{} model", model_type.to_uppercase())),
            max_tokens: optional_u64(obj, &["context_limit"]),
            supports_streaming: Some(optional_bool(obj, "supports_tools").unwrap_or(false)),
        })
    }

    /// Placeholder returned for ids the catalog does not know.
    pub fn stub(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider: None,
            capabilities: None,
            description: None,
            max_tokens: None,
            supports_streaming: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_catalog_item() {
        let raw = json!({
            "name": "gpt-4o",
            "provider": "openai",
            "model_type": "llm",
            "context_limit": 128000,
            "supports_tools": true
        });

        let model = ModelInfo::decode(&raw).unwrap();
        assert_eq!(model.id, "gpt-4o");
        assert_eq!(model.provider.as_deref(), Some("openai"));
        assert_eq!(model.description.as_deref(), Some("LLM model"));
        assert_eq!(model.max_tokens, Some(128_000));
        assert_eq!(model.supports_streaming, Some(true));
        assert_eq!(model.capabilities, Some(vec![]));
    }

    #[test]
    fn test_decode_defaults() {
        let model =
            ModelInfo::decode(&json!({"name": "embed-small", "model_type": "embedding"})).unwrap();
        assert_eq!(model.description.as_deref(), Some("EMBEDDING model"));
        assert_eq!(model.supports_streaming, Some(false));
        assert!(model.provider.is_none());

        assert!(ModelInfo::decode(&json!({"provider": "x"})).is_err());
    }

    #[test]
    fn test_stub() {
        let model = ModelInfo::stub("custom");
        assert_eq!(model.id, "custom");
        assert_eq!(model.name, "custom");
        assert!(model.provider.is_none());
    }
}
