//! In-memory stand-in for the remote platform, used by tests across the
//! workspace.
//!
//! State is partitioned by API key exactly like the real platform, ids are
//! assigned here (playing the role of the platform), and failures can be
//! scripted per operation. Payloads are stored as raw JSON so tests can plant
//! malformed items.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use boardview_models::{AssistantCreate, AssistantUpdate, DocumentTarget, FileUpload, Metadata};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::client::{MODEL_PAGE_SIZE, ModelPage, PageRequest, RemoteClient, RemoteConnector};
use crate::error::{RemoteError, Result};

#[derive(Default)]
struct Namespace {
    assistants: Vec<Value>,
    memories: HashMap<String, Vec<Value>>,
    threads: Vec<Value>,
    documents: Vec<(DocumentTarget, Value)>,
}

#[derive(Default)]
struct PlatformState {
    namespaces: Mutex<HashMap<String, Namespace>>,
    models: Mutex<Vec<Value>>,
    rejected_keys: Mutex<HashSet<String>>,
    failing_memory_lists: Mutex<HashSet<String>>,
    failing_model_pages: Mutex<HashSet<usize>>,
    failing_operations: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    next_id: AtomicU64,
}

/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<PlatformState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client bound to `api_key`, typed concretely for tests.
    pub fn client(&self, api_key: &str) -> InMemoryClient {
        InMemoryClient {
            platform: self.clone(),
            api_key: api_key.to_string(),
        }
    }

    /// Every call made with `api_key` fails with an authorization error.
    pub fn reject_key(&self, api_key: &str) {
        self.state.rejected_keys.lock().insert(api_key.to_string());
    }

    /// Listing memories of `assistant_id` fails.
    pub fn fail_memory_listing(&self, assistant_id: &str) {
        self.state
            .failing_memory_lists
            .lock()
            .insert(assistant_id.to_string());
    }

    /// The model page starting at `skip` fails.
    pub fn fail_model_page(&self, skip: usize) {
        self.state.failing_model_pages.lock().insert(skip);
    }

    /// Every call to `operation` (e.g. `"list_assistants"`) fails.
    pub fn fail_operation(&self, operation: &'static str) {
        self.state.failing_operations.lock().insert(operation);
    }

    pub fn restore_operation(&self, operation: &'static str) {
        self.state.failing_operations.lock().remove(operation);
    }

    /// Number of calls made to `operation` across all keys.
    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .calls
            .lock()
            .get(operation)
            .copied()
            .unwrap_or_default()
    }

    pub fn insert_raw_assistant(&self, api_key: &str, raw: Value) {
        self.with_namespace(api_key, |ns| ns.assistants.push(raw));
    }

    pub fn insert_raw_thread(&self, api_key: &str, raw: Value) {
        self.with_namespace(api_key, |ns| ns.threads.push(raw));
    }

    pub fn insert_raw_memory(&self, api_key: &str, assistant_id: &str, raw: Value) {
        self.with_namespace(api_key, |ns| {
            ns.memories
                .entry(assistant_id.to_string())
                .or_default()
                .push(raw)
        });
    }

    pub fn insert_raw_document(&self, api_key: &str, target: DocumentTarget, raw: Value) {
        self.with_namespace(api_key, |ns| ns.documents.push((target, raw)));
    }

    pub fn insert_model(&self, raw: Value) {
        self.state.models.lock().push(raw);
    }

    /// Raw memories stored under `assistant_id`.
    pub fn memories_of(&self, api_key: &str, assistant_id: &str) -> Vec<Value> {
        self.with_namespace(api_key, |ns| {
            ns.memories.get(assistant_id).cloned().unwrap_or_default()
        })
    }

    /// Raw assistants whose name equals `name`.
    pub fn assistants_named(&self, api_key: &str, name: &str) -> Vec<Value> {
        self.with_namespace(api_key, |ns| {
            ns.assistants
                .iter()
                .filter(|assistant| assistant["name"] == name)
                .cloned()
                .collect()
        })
    }

    fn with_namespace<T>(&self, api_key: &str, f: impl FnOnce(&mut Namespace) -> T) -> T {
        let mut namespaces = self.state.namespaces.lock();
        f(namespaces.entry(api_key.to_string()).or_default())
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id}")
    }
}

impl RemoteConnector for InMemoryPlatform {
    fn connect(&self, api_key: &str) -> Arc<dyn RemoteClient> {
        Arc::new(self.client(api_key))
    }
}

pub struct InMemoryClient {
    platform: InMemoryPlatform,
    api_key: String,
}

impl InMemoryClient {
    fn begin(&self, operation: &'static str) -> Result<()> {
        let state = &self.platform.state;
        *state.calls.lock().entry(operation).or_default() += 1;

        if state.rejected_keys.lock().contains(&self.api_key) {
            return Err(RemoteError::Unauthorized {
                status: 401,
                message: "Invalid API key".to_string(),
            });
        }
        if state.failing_operations.lock().contains(operation) {
            return Err(RemoteError::Other(format!("{operation} unavailable")));
        }
        Ok(())
    }

    fn namespace<T>(&self, f: impl FnOnce(&mut Namespace) -> T) -> T {
        self.platform.with_namespace(&self.api_key, f)
    }
}

fn not_found(kind: &str, id: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: format!("{kind} {id} not found"),
    }
}

fn matches_id(raw: &Value, key: &str, id: &str) -> bool {
    raw.get(key).and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl RemoteClient for InMemoryClient {
    async fn list_assistants(&self, skip: usize, limit: usize) -> Result<Vec<Value>> {
        self.begin("list_assistants")?;
        Ok(self.namespace(|ns| ns.assistants.iter().skip(skip).take(limit).cloned().collect()))
    }

    async fn get_assistant(&self, assistant_id: &str) -> Result<Value> {
        self.begin("get_assistant")?;
        self.namespace(|ns| {
            ns.assistants
                .iter()
                .find(|raw| matches_id(raw, "assistant_id", assistant_id))
                .cloned()
        })
        .ok_or_else(|| not_found("Assistant", assistant_id))
    }

    async fn create_assistant(&self, request: &AssistantCreate) -> Result<Value> {
        self.begin("create_assistant")?;
        let raw = json!({
            "assistant_id": self.platform.next_id("asst"),
            "name": request.name,
            "system_prompt": request.system_prompt,
            "created_at": "2024-01-01T00:00:00Z",
        });
        self.namespace(|ns| ns.assistants.push(raw.clone()));
        Ok(raw)
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &AssistantUpdate,
    ) -> Result<Value> {
        self.begin("update_assistant")?;
        self.namespace(|ns| {
            let raw = ns
                .assistants
                .iter_mut()
                .find(|raw| matches_id(raw, "assistant_id", assistant_id))?;
            if let Some(name) = &request.name {
                raw["name"] = json!(name);
            }
            if let Some(prompt) = &request.system_prompt {
                raw["system_prompt"] = json!(prompt);
            }
            raw["updated_at"] = json!("2024-01-02T00:00:00Z");
            Some(raw.clone())
        })
        .ok_or_else(|| not_found("Assistant", assistant_id))
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        self.begin("delete_assistant")?;
        self.namespace(|ns| {
            let before = ns.assistants.len();
            ns.assistants
                .retain(|raw| !matches_id(raw, "assistant_id", assistant_id));
            ns.memories.remove(assistant_id);
            before != ns.assistants.len()
        })
        .then_some(())
        .ok_or_else(|| not_found("Assistant", assistant_id))
    }

    async fn list_memories(&self, assistant_id: &str) -> Result<Vec<Value>> {
        self.begin("list_memories")?;
        if self
            .platform
            .state
            .failing_memory_lists
            .lock()
            .contains(assistant_id)
        {
            return Err(RemoteError::Other(format!(
                "memories of {assistant_id} unavailable"
            )));
        }
        Ok(self.namespace(|ns| ns.memories.get(assistant_id).cloned().unwrap_or_default()))
    }

    async fn get_memory(&self, assistant_id: &str, memory_id: &str) -> Result<Value> {
        self.begin("get_memory")?;
        self.namespace(|ns| {
            ns.memories
                .get(assistant_id)?
                .iter()
                .find(|raw| matches_id(raw, "id", memory_id))
                .cloned()
        })
        .ok_or_else(|| not_found("Memory", memory_id))
    }

    async fn add_memory(
        &self,
        assistant_id: &str,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Value> {
        self.begin("add_memory")?;
        let memory_id = self.platform.next_id("mem");
        let raw = json!({
            "id": memory_id,
            "content": content,
            "metadata": metadata,
        });
        self.namespace(|ns| {
            ns.memories
                .entry(assistant_id.to_string())
                .or_default()
                .push(raw)
        });
        Ok(json!({ "success": true, "memory_id": memory_id }))
    }

    async fn delete_memory(&self, assistant_id: &str, memory_id: &str) -> Result<()> {
        self.begin("delete_memory")?;
        self.namespace(|ns| {
            let memories = ns.memories.get_mut(assistant_id)?;
            let before = memories.len();
            memories.retain(|raw| !matches_id(raw, "id", memory_id));
            (before != memories.len()).then_some(())
        })
        .ok_or_else(|| not_found("Memory", memory_id))
    }

    async fn list_threads(&self, skip: usize, limit: usize) -> Result<Vec<Value>> {
        self.begin("list_threads")?;
        Ok(self.namespace(|ns| ns.threads.iter().skip(skip).take(limit).cloned().collect()))
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Value> {
        self.begin("get_thread")?;
        self.namespace(|ns| {
            ns.threads
                .iter()
                .find(|raw| matches_id(raw, "thread_id", thread_id))
                .cloned()
        })
        .ok_or_else(|| not_found("Thread", thread_id))
    }

    async fn create_thread(
        &self,
        assistant_id: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Value> {
        self.begin("create_thread")?;
        let raw = json!({
            "thread_id": self.platform.next_id("thr"),
            "assistant_id": assistant_id,
            "messages": [],
            "metadata": metadata,
            "created_at": "2024-01-01T00:00:00Z",
        });
        self.namespace(|ns| ns.threads.push(raw.clone()));
        Ok(raw)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.begin("delete_thread")?;
        self.namespace(|ns| {
            let before = ns.threads.len();
            ns.threads
                .retain(|raw| !matches_id(raw, "thread_id", thread_id));
            before != ns.threads.len()
        })
        .then_some(())
        .ok_or_else(|| not_found("Thread", thread_id))
    }

    async fn list_documents(&self, target: &DocumentTarget) -> Result<Vec<Value>> {
        self.begin("list_documents")?;
        Ok(self.namespace(|ns| {
            ns.documents
                .iter()
                .filter(|(owner, _)| owner == target)
                .map(|(_, raw)| raw.clone())
                .collect()
        }))
    }

    async fn get_document(&self, document_id: &str) -> Result<Value> {
        self.begin("get_document")?;
        self.namespace(|ns| {
            ns.documents
                .iter()
                .map(|(_, raw)| raw)
                .find(|raw| matches_id(raw, "document_id", document_id))
                .cloned()
        })
        .ok_or_else(|| not_found("Document", document_id))
    }

    async fn upload_document(&self, target: &DocumentTarget, file: FileUpload) -> Result<Value> {
        self.begin("upload_document")?;
        let raw = json!({
            "document_id": self.platform.next_id("doc"),
            "filename": file.filename,
            "file_type": file.content_type,
            "file_size_bytes": file.bytes.len(),
            "status": "pending",
            "created_at": "2024-01-01T00:00:00Z",
        });
        self.namespace(|ns| ns.documents.push((target.clone(), raw.clone())));
        Ok(raw)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.begin("delete_document")?;
        self.namespace(|ns| {
            let before = ns.documents.len();
            ns.documents
                .retain(|(_, raw)| !matches_id(raw, "document_id", document_id));
            before != ns.documents.len()
        })
        .then_some(())
        .ok_or_else(|| not_found("Document", document_id))
    }

    async fn list_models(&self, page: Option<PageRequest>) -> Result<ModelPage> {
        self.begin("list_models")?;
        let page = page.unwrap_or(PageRequest {
            skip: 0,
            limit: MODEL_PAGE_SIZE,
        });
        if self
            .platform
            .state
            .failing_model_pages
            .lock()
            .contains(&page.skip)
        {
            return Err(RemoteError::Other(format!(
                "model page at {} unavailable",
                page.skip
            )));
        }

        let models = self.platform.state.models.lock();
        Ok(ModelPage {
            total: models.len(),
            models: models
                .iter()
                .skip(page.skip)
                .take(page.limit)
                .cloned()
                .collect(),
        })
    }
}
