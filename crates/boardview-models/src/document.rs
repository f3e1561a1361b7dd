//! Document records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{
    DecodeResult, Metadata, as_object, first_string, metadata, opaque_id, optional_timestamp,
    optional_u64, required_string,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub size: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub metadata: Option<Metadata>,
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Document {
    /// Decode an upstream document payload. Upload and status responses
    /// name the file `filename`; listings sometimes use `name`.
    pub fn decode(raw: &Value) -> DecodeResult<Self> {
        let obj = as_object(raw, "document")?;
        Ok(Self {
            id: opaque_id(obj, &["document_id", "id"]),
            name: required_string(obj, &["name", "filename"], "document", "name")?,
            kind: first_string(obj, &["type", "file_type", "content_type"]),
            size: optional_u64(obj, &["size", "file_size_bytes", "size_bytes"]),
            uploaded_at: optional_timestamp(obj, &["uploaded_at", "created_at"]),
            metadata: metadata(obj, "metadata"),
            url: first_string(obj, &["url"]),
            status: first_string(obj, &["status"]),
        })
    }
}

pub fn decode_documents(items: &[Value]) -> Vec<Document> {
    items
        .iter()
        .filter_map(|item| match Document::decode(item) {
            Ok(document) => Some(document),
            Err(issue) => {
                tracing::warn!(%issue, "Dropping unreadable document");
                None
            }
        })
        .collect()
}

/// Optional descriptive fields sent along with an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentCreate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Where an uploaded document is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTarget {
    Assistant(String),
    Thread(String),
}

impl DocumentTarget {
    /// Assistant wins when both ids are given; blank ids are ignored.
    pub fn resolve(assistant_id: Option<&str>, thread_id: Option<&str>) -> Option<Self> {
        fn present(id: Option<&str>) -> Option<&str> {
            id.map(str::trim).filter(|id| !id.is_empty())
        }
        present(assistant_id)
            .map(|id| Self::Assistant(id.to_string()))
            .or_else(|| present(thread_id).map(|id| Self::Thread(id.to_string())))
    }
}

/// Raw file received from the browser.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_status_payload() {
        let raw = json!({
            "document_id": "d-9",
            "filename": "notes.pdf",
            "status": "indexed",
            "file_size_bytes": 2048,
            "created_at": "2024-03-03T03:03:03Z"
        });

        let document = Document::decode(&raw).unwrap();
        assert_eq!(document.id.as_deref(), Some("d-9"));
        assert_eq!(document.name, "notes.pdf");
        assert_eq!(document.size, Some(2048));
        assert_eq!(document.status.as_deref(), Some("indexed"));
        assert!(document.uploaded_at.is_some());
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let document =
            Document::decode(&json!({"id": "d", "name": "a.txt", "type": "text"})).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["type"], "text");
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_target_resolution() {
        assert_eq!(
            DocumentTarget::resolve(Some("a"), Some("t")),
            Some(DocumentTarget::Assistant("a".to_string()))
        );
        assert_eq!(
            DocumentTarget::resolve(Some("  "), Some("t")),
            Some(DocumentTarget::Thread("t".to_string()))
        );
        assert_eq!(DocumentTarget::resolve(None, None), None);
    }
}
