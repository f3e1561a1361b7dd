use axum::{
    Json, Router,
    extract::Path,
    http::header,
    response::IntoResponse,
    routing::get,
};
use boardview_models::ModelInfo;

use super::data;
use crate::error::ApiResult;
use crate::session::Session;

/// Browsers may reuse the catalog for as long as the server keeps it.
const CATALOG_CACHE_CONTROL: &str = "public, max-age=3600";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_models))
        .route("/{id}", get(get_model))
}

/// Catalog failures degrade to an empty list rather than an error.
async fn list_models(session: Session) -> ApiResult<impl IntoResponse> {
    let models = session.proxy()?.list_models().await;
    Ok((
        [(header::CACHE_CONTROL, CATALOG_CACHE_CONTROL)],
        data(models),
    ))
}

async fn get_model(session: Session, Path(id): Path<String>) -> ApiResult<Json<ModelInfo>> {
    Ok(Json(session.proxy()?.get_model_info(&id).await))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use axum::http::{StatusCode, header};
    use serde_json::json;

    #[tokio::test]
    async fn test_catalog_listing_is_cacheable() {
        let test = authed();
        for i in 0..3 {
            test.platform
                .insert_model(json!({"name": format!("model-{i}"), "provider": "acme"}));
        }

        let (status, headers, body) = send(&test.app, get("/api/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
        assert_eq!(body["data"].as_array().unwrap().len(), 3);

        send(&test.app, get("/api/models")).await;
        assert_eq!(test.platform.calls("list_models"), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_empty() {
        let test = authed();
        test.platform.insert_model(json!({"name": "m"}));
        test.platform.fail_operation("list_models");

        let (status, _, body) = send(&test.app, get("/api/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"data": []}));
    }

    #[tokio::test]
    async fn test_unknown_model_gets_stub() {
        let test = authed();
        test.platform
            .insert_model(json!({"name": "gpt-4o", "provider": "openai"}));

        let (_, _, known) = send(&test.app, get("/api/models/gpt-4o")).await;
        assert_eq!(known["provider"], "openai");

        let (status, _, unknown) = send(&test.app, get("/api/models/mystery")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unknown["id"], "mystery");
        assert_eq!(unknown["name"], "mystery");
    }
}
