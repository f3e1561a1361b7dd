use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use boardview_models::{Assistant, AssistantCreate, AssistantUpdate};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{JsonBody, QueryParams, data, success};
use crate::error::ApiResult;
use crate::session::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assistants).post(create_assistant))
        .route(
            "/{id}",
            get(get_assistant)
                .put(update_assistant)
                .delete(delete_assistant),
        )
        .route("/{id}/threads", get(list_assistant_threads))
        .route("/{id}/memories", get(list_assistant_memories))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    1000
}

async fn list_assistants(
    session: Session,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    let assistants = session
        .proxy()?
        .list_assistants(query.skip, query.limit)
        .await?;
    Ok(Json(json!({ "count": assistants.len(), "data": assistants })))
}

async fn get_assistant(session: Session, Path(id): Path<String>) -> ApiResult<Json<Assistant>> {
    Ok(Json(session.proxy()?.get_assistant(&id).await?))
}

async fn create_assistant(
    session: Session,
    JsonBody(request): JsonBody<AssistantCreate>,
) -> ApiResult<impl IntoResponse> {
    let assistant = session.proxy()?.create_assistant(&request).await?;
    Ok((StatusCode::CREATED, Json(assistant)))
}

async fn update_assistant(
    session: Session,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<AssistantUpdate>,
) -> ApiResult<Json<Assistant>> {
    Ok(Json(session.proxy()?.update_assistant(&id, &request).await?))
}

async fn delete_assistant(session: Session, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    session.proxy()?.delete_assistant(&id).await?;
    Ok(success())
}

async fn list_assistant_threads(
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(data(session.proxy()?.list_assistant_threads(&id).await?))
}

async fn list_assistant_memories(
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(data(session.proxy()?.list_memories(&id).await?))
}
