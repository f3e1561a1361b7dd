use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use boardview_core::SEARCH_ALL_DEFAULT_LIMIT;
use boardview_models::{DEFAULT_SEARCH_LIMIT, Memory, MemoryCreate, MemorySearch};
use serde::Deserialize;
use serde_json::Value;

use super::{JsonBody, QueryParams, data, success};
use crate::error::ApiResult;
use crate::session::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_memories).post(store_memory))
        .route("/search", post(search_memories))
        .route("/{id}", get(get_memory).delete(delete_memory))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    assistant_id: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    #[serde(default)]
    assistant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreRequest {
    #[serde(default)]
    assistant_id: Option<String>,
    #[serde(flatten)]
    memory: MemoryCreate,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default)]
    assistant_id: Option<String>,
    #[serde(default)]
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Without `assistant_id` there is nothing to list; the dashboard
/// aggregates per assistant itself.
async fn list_memories(
    session: Session,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    let Some(assistant_id) = present(query.assistant_id) else {
        return Ok(data(Vec::<Memory>::new()));
    };

    let proxy = session.proxy()?;
    let memories = match present(query.query) {
        Some(text) => {
            let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            let search = MemorySearch::new(text).with_limit(limit);
            proxy.search_memory(&assistant_id, &search).await?
        }
        None => proxy.list_memories(&assistant_id).await?,
    };
    Ok(data(memories))
}

async fn get_memory(
    session: Session,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<OwnerQuery>,
) -> ApiResult<Json<Memory>> {
    let assistant_id = query.assistant_id.unwrap_or_default();
    Ok(Json(session.proxy()?.get_memory(&assistant_id, &id).await?))
}

async fn store_memory(
    session: Session,
    JsonBody(request): JsonBody<StoreRequest>,
) -> ApiResult<impl IntoResponse> {
    let assistant_id = request.assistant_id.unwrap_or_default();
    let memory = session
        .proxy()?
        .store_memory(&assistant_id, &request.memory)
        .await?;
    Ok((StatusCode::CREATED, Json(memory)))
}

/// Search one assistant, or every assistant when `assistant_id` is absent.
async fn search_memories(
    session: Session,
    JsonBody(request): JsonBody<SearchRequest>,
) -> ApiResult<Json<Value>> {
    let proxy = session.proxy()?;
    match present(request.assistant_id) {
        Some(assistant_id) => {
            let search = MemorySearch {
                query: request.query,
                limit: Some(request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)),
                tags: request.tags,
            };
            Ok(data(proxy.search_memory(&assistant_id, &search).await?))
        }
        None => {
            let limit = request.limit.unwrap_or(SEARCH_ALL_DEFAULT_LIMIT);
            Ok(data(proxy.search_all_memories(&request.query, limit).await?))
        }
    }
}

async fn delete_memory(
    session: Session,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<OwnerQuery>,
) -> ApiResult<Json<Value>> {
    let assistant_id = query.assistant_id.unwrap_or_default();
    session.proxy()?.delete_memory(&assistant_id, &id).await?;
    Ok(success())
}
