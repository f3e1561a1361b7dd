use std::sync::Arc;

use axum::{Extension, Json, Router, http::HeaderValue, routing::get};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::ServerConfig;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config);
    let static_dir = state.config.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state));

    if let Some(dir) = static_dir.filter(|dir| dir.is_dir()) {
        let index = dir.join("index.html");
        let static_service = ServeDir::new(&dir).fallback(ServeFile::new(index));
        app = app.fallback_service(static_service);
    }

    app
}

/// Any origin unless specific ones are configured. Session cookies only
/// cross origins in the explicit case, where credentials are allowed.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let wildcard = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return wildcard;
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        wildcard
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

async fn health_check() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get, send};
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use boardview_core::ManualClock;
    use boardview_remote::InMemoryPlatform;
    use serde_json::json;

    fn app_with(config: ServerConfig) -> Router {
        let state = AppState::new(
            config,
            Arc::new(InMemoryPlatform::new()),
            Arc::new(ManualClock::new(0)),
        );
        build_router(Arc::new(state))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/assistants")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(ServerConfig::default());

        let (status, _, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_cors_defaults_to_any_origin() {
        let app = app_with(ServerConfig::default());

        let (_, headers, _) = send(&app, preflight("http://elsewhere.test")).await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_cors_explicit_origins_allow_credentials() {
        let app = app_with(ServerConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..ServerConfig::default()
        });

        let (_, headers, _) = send(&app, preflight("http://localhost:3000")).await;
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let (_, headers, _) = send(&app, preflight("http://evil.test")).await;
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_static_dir_serves_index_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>dashboard</html>").unwrap();
        let app = app_with(ServerConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        });

        let response = tower::ServiceExt::oneshot(app, get("/assistants/a-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<html>dashboard</html>");
    }
}
