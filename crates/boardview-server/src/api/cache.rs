//! Dashboard counters. Each total is cached for an hour so the overview
//! page does not fan out across every assistant on each load.

use axum::{Json, Router, routing::get};
use boardview_core::CountReport;

use crate::error::ApiResult;
use crate::session::Session;

pub fn router() -> Router {
    Router::new()
        .route("/assistants-count", get(assistants_count))
        .route("/memory-count", get(memory_count))
        .route("/threads-count", get(threads_count))
        .route("/documents-count", get(documents_count))
        .route("/models-count", get(models_count))
}

async fn assistants_count(session: Session) -> ApiResult<Json<CountReport>> {
    Ok(Json(session.stats()?.count_assistants().await?))
}

async fn memory_count(session: Session) -> ApiResult<Json<CountReport>> {
    Ok(Json(session.stats()?.count_memories().await?))
}

async fn threads_count(session: Session) -> ApiResult<Json<CountReport>> {
    Ok(Json(session.stats()?.count_threads().await?))
}

async fn documents_count(session: Session) -> ApiResult<Json<CountReport>> {
    Ok(Json(session.stats()?.count_documents().await?))
}

async fn models_count(session: Session) -> ApiResult<Json<CountReport>> {
    Ok(Json(session.stats()?.count_models().await?))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::config::CacheBackend;
    use axum::http::StatusCode;
    use boardview_core::CACHE_HOLDER_NAME;
    use boardview_models::DocumentTarget;
    use serde_json::json;

    fn seed(test: &TestApp) {
        for id in ["a-1", "a-2"] {
            test.platform
                .insert_raw_assistant(TEST_KEY, json!({"assistant_id": id, "name": id}));
        }
        test.platform
            .insert_raw_memory(TEST_KEY, "a-1", json!({"id": "m-1", "content": "x"}));
        test.platform
            .insert_raw_memory(TEST_KEY, "a-2", json!({"id": "m-2", "content": "y"}));
        test.platform
            .insert_raw_memory(TEST_KEY, "a-2", json!({"id": "m-3", "content": "z"}));
        test.platform
            .insert_raw_thread(TEST_KEY, json!({"thread_id": "t-1", "assistant_id": "a-1"}));
        test.platform.insert_raw_document(
            TEST_KEY,
            DocumentTarget::Assistant("a-2".to_string()),
            json!({"document_id": "d-1", "filename": "a.pdf"}),
        );
    }

    #[tokio::test]
    async fn test_counts_are_cached() {
        let test = authed();
        seed(&test);

        let (status, _, first) = send(&test.app, get("/api/cache/memory-count")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({"count": 3, "cached": false}));

        test.platform
            .insert_raw_memory(TEST_KEY, "a-1", json!({"id": "m-4", "content": "w"}));
        let (_, _, second) = send(&test.app, get("/api/cache/memory-count")).await;
        assert_eq!(second, json!({"count": 3, "cached": true}));
    }

    #[tokio::test]
    async fn test_each_counter() {
        let test = authed();
        seed(&test);
        test.platform
            .insert_model(json!({"name": "m-a", "provider": "acme"}));
        test.platform
            .insert_model(json!({"name": "m-b", "provider": "acme"}));

        let (_, _, assistants) = send(&test.app, get("/api/cache/assistants-count")).await;
        assert_eq!(assistants["count"], 2);

        let (_, _, threads) = send(&test.app, get("/api/cache/threads-count")).await;
        assert_eq!(threads["count"], 1);

        let (_, _, documents) = send(&test.app, get("/api/cache/documents-count")).await;
        assert_eq!(documents["count"], 1);

        let (_, _, models) = send(&test.app, get("/api/cache/models-count")).await;
        assert_eq!(models, json!({"count": 2, "providers": 1, "cached": false}));
    }

    #[tokio::test]
    async fn test_remote_backend_stores_in_holder() {
        let test = test_app(true, CacheBackend::Remote);
        seed(&test);

        let (_, _, first) = send(&test.app, get("/api/cache/threads-count")).await;
        assert_eq!(first, json!({"count": 1, "cached": false}));

        let (_, _, second) = send(&test.app, get("/api/cache/threads-count")).await;
        assert_eq!(second, json!({"count": 1, "cached": true}));

        let holders = test.platform.assistants_named(TEST_KEY, CACHE_HOLDER_NAME);
        assert_eq!(holders.len(), 1);
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let test = test_app(false, CacheBackend::Local);

        let (status, _, body) = send(&test.app, get("/api/cache/assistants-count")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "API key not found in session"}));
    }
}
