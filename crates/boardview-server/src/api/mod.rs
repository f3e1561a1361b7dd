pub mod assistants;
pub mod auth;
pub mod cache;
pub mod documents;
pub mod memory;
pub mod models;
pub mod threads;

use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde_json::{Value, json};

use crate::error::ApiError;

/// Build the API router with all resource routes
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/assistants", assistants::router())
        .nest("/threads", threads::router())
        .nest("/memory", memory::router())
        .nest("/documents", documents::router())
        .nest("/models", models::router())
        .nest("/cache", cache::router())
}

/// `{success: true}`, the answer to deletes.
pub(crate) fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// `{data: [...]}` envelope used by listings.
pub(crate) fn data<T: serde::Serialize>(items: T) -> Json<Value> {
    Json(json!({ "data": items }))
}

/// JSON body whose rejections use the API error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}

/// Query string whose rejections use the API error shape.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}
