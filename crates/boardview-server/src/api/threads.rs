use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use boardview_models::{Thread, ThreadCreate};
use serde::Deserialize;
use serde_json::Value;

use super::{JsonBody, data, success};
use crate::error::ApiResult;
use crate::session::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_threads).post(create_thread))
        .route("/{id}", get(get_thread).delete(delete_thread))
}

#[derive(Debug, Deserialize)]
struct CreateThreadRequest {
    #[serde(default)]
    assistant_id: Option<String>,
    #[serde(flatten)]
    thread: ThreadCreate,
}

async fn list_threads(session: Session) -> ApiResult<Json<Value>> {
    Ok(data(session.proxy()?.list_threads().await?))
}

async fn get_thread(session: Session, Path(id): Path<String>) -> ApiResult<Json<Thread>> {
    Ok(Json(session.proxy()?.get_thread(&id).await?))
}

async fn create_thread(
    session: Session,
    JsonBody(request): JsonBody<CreateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let assistant_id = request.assistant_id.unwrap_or_default();
    let thread = session
        .proxy()?
        .create_thread(&assistant_id, &request.thread)
        .await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

async fn delete_thread(session: Session, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    session.proxy()?.delete_thread(&id).await?;
    Ok(success())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_listing_survives_odd_payloads() {
        let test = authed();
        test.platform.insert_raw_thread(
            TEST_KEY,
            json!({
                "thread_id": "t-1",
                "messages": [{"role": "tool", "content": "ok"}, {"role": null, "content": "hi"}]
            }),
        );
        test.platform.insert_raw_thread(TEST_KEY, json!(["not", "a", "thread"]));

        let (status, _, body) = send(&test.app, get("/api/threads")).await;

        assert_eq!(status, StatusCode::OK);
        let threads = body["data"].as_array().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0]["id"], "t-1");
        assert_eq!(threads[0]["messages"][0]["role"], "tool");
        assert_eq!(threads[0]["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_create_requires_assistant_id() {
        let test = authed();

        let (status, _, body) =
            send(&test.app, json_request("POST", "/api/threads", json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "assistant_id is required"}));
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let test = authed();

        let (status, _, created) = send(
            &test.app,
            json_request("POST", "/api/threads", json!({"assistant_id": "a-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _, fetched) = send(&test.app, get(&format!("/api/threads/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["assistant_id"], "a-1");

        let (_, _, body) = send(&test.app, delete(&format!("/api/threads/{id}"))).await;
        assert_eq!(body, json!({"success": true}));
    }
}
