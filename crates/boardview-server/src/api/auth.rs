use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{JsonBody, success};
use crate::error::{ApiError, ApiResult};
use crate::session::{expired_session_cookie, session_cookie, session_id};
use crate::state::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/", post(set_api_key).delete(clear_api_key))
        .route("/check", get(check_auth))
}

#[derive(Debug, Deserialize)]
struct AuthRequest {
    #[serde(default)]
    api_key: Option<String>,
}

async fn set_api_key(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<AuthRequest>,
) -> ApiResult<impl IntoResponse> {
    let api_key = request
        .api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("API key is required"))?;

    let session_id = state
        .sessions
        .remember(session_id(&headers).as_deref(), &api_key);
    let cookie = session_cookie(&session_id)
        .ok_or_else(|| ApiError::internal("Failed to encode session cookie"))?;
    info!("API key stored in session");

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), success()))
}

async fn check_auth(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    Json(json!({ "authenticated": state.resolve_api_key(&headers).is_some() }))
}

async fn clear_api_key(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(id) = session_id(&headers) {
        state.sessions.forget(&id);
    }
    (
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        success(),
    )
}
