//! Browser sessions.
//!
//! A session is an opaque id in the `boardview_session` cookie mapped to
//! the API key the user entered. Sessions live in memory only.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use boardview_core::{DashboardStats, ProxyService};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "boardview_session";

#[derive(Default)]
pub struct SessionStore {
    keys: DashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `api_key` under a fresh session id, dropping `previous` if
    /// given. Ids are never taken from the client.
    pub fn remember(&self, previous: Option<&str>, api_key: &str) -> String {
        if let Some(previous) = previous {
            self.keys.remove(previous);
        }
        let session_id = Uuid::new_v4().to_string();
        self.keys.insert(session_id.clone(), api_key.to_string());
        session_id
    }

    pub fn api_key(&self, session_id: &str) -> Option<String> {
        self.keys.get(session_id).map(|key| key.value().clone())
    }

    pub fn forget(&self, session_id: &str) {
        self.keys.remove(session_id);
    }
}

/// Session id carried by the request cookie, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(session_id: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("boardview_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Request context with a resolved API key: the session's key, else the
/// configured default key. Rejects with 401 when neither exists.
pub struct Session {
    pub state: Arc<AppState>,
    pub api_key: String,
}

impl Session {
    pub fn proxy(&self) -> ApiResult<ProxyService> {
        self.state.proxy(&self.api_key)
    }

    pub fn stats(&self) -> ApiResult<DashboardStats> {
        self.state.stats(&self.api_key)
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Application state is not configured"))?;

        let api_key = state
            .resolve_api_key(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("API key not found in session"))?;

        Ok(Self { state, api_key })
    }
}
