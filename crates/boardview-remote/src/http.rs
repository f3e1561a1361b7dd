//! reqwest-backed client for the platform's REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boardview_models::{AssistantCreate, AssistantUpdate, DocumentTarget, FileUpload, Metadata};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value, json};

use crate::client::{ModelPage, PageRequest, RemoteClient, RemoteConnector};
use crate::error::{RemoteError, Result};
use crate::http_client::build_http_client;

pub const DEFAULT_BASE_URL: &str = "https://app.backboard.io/api";
pub const API_KEY_HEADER: &str = "X-API-Key";

const MAX_ERROR_BODY: usize = 512;

/// Shares one connection pool across every API key.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
}

impl HttpConnector {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl RemoteConnector for HttpConnector {
    fn connect(&self, api_key: &str) -> Arc<dyn RemoteClient> {
        Arc::new(HttpRemoteClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
        })
    }
}

pub struct HttpRemoteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        tracing::debug!(path, "GET remote");
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        tracing::debug!(path, "POST remote");
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        tracing::debug!(path, "PUT remote");
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!(path, "DELETE remote");
        self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list_assistants(&self, skip: usize, limit: usize) -> Result<Vec<Value>> {
        let value = self
            .get(&format!("/assistants?skip={skip}&limit={limit}"))
            .await?;
        items_of(value, "assistants")
    }

    async fn get_assistant(&self, assistant_id: &str) -> Result<Value> {
        self.get(&format!("/assistants/{}", segment(assistant_id)))
            .await
    }

    async fn create_assistant(&self, request: &AssistantCreate) -> Result<Value> {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(request.name));
        if let Some(prompt) = &request.system_prompt {
            body.insert("system_prompt".to_string(), json!(prompt));
        }
        self.post("/assistants", &Value::Object(body)).await
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &AssistantUpdate,
    ) -> Result<Value> {
        let mut body = Map::new();
        if let Some(name) = &request.name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(prompt) = &request.system_prompt {
            body.insert("system_prompt".to_string(), json!(prompt));
        }
        self.put(
            &format!("/assistants/{}", segment(assistant_id)),
            &Value::Object(body),
        )
        .await
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        self.delete(&format!("/assistants/{}", segment(assistant_id)))
            .await
    }

    async fn list_memories(&self, assistant_id: &str) -> Result<Vec<Value>> {
        let value = self
            .get(&format!("/assistants/{}/memories", segment(assistant_id)))
            .await?;
        items_of(value, "memories")
    }

    async fn get_memory(&self, assistant_id: &str, memory_id: &str) -> Result<Value> {
        self.get(&format!(
            "/assistants/{}/memories/{}",
            segment(assistant_id),
            segment(memory_id)
        ))
        .await
    }

    async fn add_memory(
        &self,
        assistant_id: &str,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Value> {
        let body = json!({
            "content": content,
            "metadata": metadata,
        });
        self.post(
            &format!("/assistants/{}/memories", segment(assistant_id)),
            &body,
        )
        .await
    }

    async fn delete_memory(&self, assistant_id: &str, memory_id: &str) -> Result<()> {
        self.delete(&format!(
            "/assistants/{}/memories/{}",
            segment(assistant_id),
            segment(memory_id)
        ))
        .await
    }

    async fn list_threads(&self, skip: usize, limit: usize) -> Result<Vec<Value>> {
        let value = self.get(&format!("/threads?skip={skip}&limit={limit}")).await?;
        items_of(value, "threads")
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Value> {
        self.get(&format!("/threads/{}", segment(thread_id))).await
    }

    async fn create_thread(
        &self,
        assistant_id: &str,
        metadata: Option<&Metadata>,
    ) -> Result<Value> {
        let body = match metadata {
            Some(metadata) => json!({ "metadata": metadata }),
            None => json!({}),
        };
        self.post(
            &format!("/assistants/{}/threads", segment(assistant_id)),
            &body,
        )
        .await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.delete(&format!("/threads/{}", segment(thread_id))).await
    }

    async fn list_documents(&self, target: &DocumentTarget) -> Result<Vec<Value>> {
        let value = self.get(&documents_path(target)).await?;
        items_of(value, "documents")
    }

    async fn get_document(&self, document_id: &str) -> Result<Value> {
        self.get(&format!("/documents/{}/status", segment(document_id)))
            .await
    }

    async fn upload_document(&self, target: &DocumentTarget, file: FileUpload) -> Result<Value> {
        let path = documents_path(target);
        tracing::debug!(
            path = %path,
            filename = %file.filename,
            size = file.bytes.len(),
            "Uploading document"
        );

        let mut part = Part::bytes(file.bytes).file_name(file.filename);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);
        self.send(self.client.post(self.url(&path)).multipart(form))
            .await
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.delete(&format!("/documents/{}", segment(document_id)))
            .await
    }

    async fn list_models(&self, page: Option<PageRequest>) -> Result<ModelPage> {
        let path = match page {
            Some(page) => format!("/models?skip={}&limit={}", page.skip, page.limit),
            None => "/models".to_string(),
        };
        let value = self.get(&path).await?;
        let total = value
            .get("total")
            .and_then(Value::as_u64)
            .map(|total| total as usize);
        let models = items_of(value, "models")?;
        Ok(ModelPage {
            total: total.unwrap_or(models.len()),
            models,
        })
    }
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

fn documents_path(target: &DocumentTarget) -> String {
    match target {
        DocumentTarget::Assistant(id) => format!("/assistants/{}/documents", segment(id)),
        DocumentTarget::Thread(id) => format!("/threads/{}/documents", segment(id)),
    }
}

/// Listing endpoints answer either with a bare array or with an object that
/// wraps the array under `key` (or `data`).
fn items_of(value: Value, key: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut obj) => match obj.remove(key).or_else(|| obj.remove("data")) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(RemoteError::InvalidFormat(format!(
                "expected `{key}` to be an array, got {other}"
            ))),
        },
        other => Err(RemoteError::InvalidFormat(format!(
            "expected a list of {key}, got {other}"
        ))),
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // Truncate error body to keep large upstream pages out of API errors.
    let message = if body.chars().count() > MAX_ERROR_BODY {
        let head: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}... [truncated]", head)
    } else {
        body
    };
    let message = extract_detail(&message).unwrap_or(message);

    tracing::warn!(status = status.as_u16(), %message, "Remote platform returned an error");

    let status = status.as_u16();
    if status == 401 || status == 403 {
        Err(RemoteError::Unauthorized { status, message })
    } else {
        Err(RemoteError::Status { status, message })
    }
}

/// Error bodies are usually `{"detail": "..."}`; surface the detail alone.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpRemoteClient {
        HttpRemoteClient::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_assistants_sends_key_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assistants"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "1000"))
            .and(header(API_KEY_HEADER, "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"assistant_id": "a1", "name": "One"},
                {"assistant_id": "a2", "name": "Two"}
            ])))
            .mount(&server)
            .await;

        let items = client_for(&server).list_assistants(0, 1000).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["assistant_id"], "a2");
    }

    #[tokio::test]
    async fn test_create_assistant_sends_name_and_prompt_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assistants"))
            .and(body_json(json!({"name": "Helper", "system_prompt": "Be brief"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"assistant_id": "a1", "name": "Helper"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut request = AssistantCreate::new("Helper").with_system_prompt("Be brief");
        request.model = Some("gpt-4o".to_string());
        let created = client_for(&server).create_assistant(&request).await.unwrap();
        assert_eq!(created["assistant_id"], "a1");
    }

    #[tokio::test]
    async fn test_list_memories_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assistants/a1/memories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memories": [{"id": "m1", "content": "likes tea"}],
                "total_count": 1
            })))
            .mount(&server)
            .await;

        let items = client_for(&server).list_memories("a1").await.unwrap();
        assert_eq!(items, vec![json!({"id": "m1", "content": "likes tea"})]);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_dedicated_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/t1"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let error = client_for(&server).get_thread("t1").await.unwrap_err();
        assert!(error.is_unauthorized());
        assert!(error.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/d1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let error = client_for(&server).delete_document("d1").await.unwrap_err();
        match error {
            RemoteError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/assistants/a1/memories/m1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server).delete_memory("a1", "m1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_models_reads_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("skip", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "m-101"}],
                "total": 101
            })))
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list_models(Some(PageRequest { skip: 100, limit: 100 }))
            .await
            .unwrap();
        assert_eq!(page.total, 101);
        assert_eq!(page.models.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_targets_thread_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "document_id": "d1",
                "filename": "a.txt",
                "status": "pending"
            })))
            .mount(&server)
            .await;

        let file = FileUpload {
            filename: "a.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        };
        let value = client_for(&server)
            .upload_document(&DocumentTarget::Thread("t1".to_string()), file)
            .await
            .unwrap();
        assert_eq!(value["document_id"], "d1");
    }

    #[test]
    fn test_items_of_shapes() {
        assert_eq!(items_of(json!([1, 2]), "x").unwrap().len(), 2);
        assert_eq!(items_of(json!({"x": [1]}), "x").unwrap().len(), 1);
        assert_eq!(items_of(json!({"data": [1, 2, 3]}), "x").unwrap().len(), 3);
        assert!(items_of(Value::Null, "x").unwrap().is_empty());
        assert!(items_of(json!("text"), "x").is_err());
        assert!(items_of(json!({"x": 5}), "x").is_err());
    }

    #[test]
    fn test_segment_escapes_ids() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
