//! Remote client traits.
//!
//! The boundary hands back raw JSON; turning payloads into records is the
//! caller's job so that a single bad item never fails a whole call here.

use std::sync::Arc;

use async_trait::async_trait;
use boardview_models::{AssistantCreate, AssistantUpdate, DocumentTarget, FileUpload, Metadata};
use serde_json::Value;

use crate::error::Result;

/// Page size used by the model catalog endpoint.
pub const MODEL_PAGE_SIZE: usize = 100;

/// Explicit page of the model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: usize,
    pub limit: usize,
}

/// One response from the model catalog endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPage {
    /// Total catalog size as reported upstream.
    pub total: usize,
    pub models: Vec<Value>,
}

/// Operations offered by the remote platform, bound to one API key.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_assistants(&self, skip: usize, limit: usize) -> Result<Vec<Value>>;
    async fn get_assistant(&self, assistant_id: &str) -> Result<Value>;
    async fn create_assistant(&self, request: &AssistantCreate) -> Result<Value>;
    async fn update_assistant(&self, assistant_id: &str, request: &AssistantUpdate)
    -> Result<Value>;
    async fn delete_assistant(&self, assistant_id: &str) -> Result<()>;

    async fn list_memories(&self, assistant_id: &str) -> Result<Vec<Value>>;
    async fn get_memory(&self, assistant_id: &str, memory_id: &str) -> Result<Value>;
    async fn add_memory(
        &self,
        assistant_id: &str,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Value>;
    async fn delete_memory(&self, assistant_id: &str, memory_id: &str) -> Result<()>;

    async fn list_threads(&self, skip: usize, limit: usize) -> Result<Vec<Value>>;
    async fn get_thread(&self, thread_id: &str) -> Result<Value>;
    async fn create_thread(&self, assistant_id: &str, metadata: Option<&Metadata>)
    -> Result<Value>;
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    async fn list_documents(&self, target: &DocumentTarget) -> Result<Vec<Value>>;
    async fn get_document(&self, document_id: &str) -> Result<Value>;
    async fn upload_document(&self, target: &DocumentTarget, file: FileUpload) -> Result<Value>;
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Fetch the model catalog. `None` requests the default first page and
    /// is how callers learn the catalog size.
    async fn list_models(&self, page: Option<PageRequest>) -> Result<ModelPage>;
}

/// Produces clients scoped to an API key.
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Arc<dyn RemoteClient>;
}
