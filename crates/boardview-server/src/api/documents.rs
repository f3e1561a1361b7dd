use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use boardview_models::{Document, DocumentCreate, DocumentTarget, FileUpload, Metadata};
use serde::Deserialize;
use serde_json::Value;

use super::{QueryParams, data, success};
use crate::error::{ApiError, ApiResult};
use crate::session::Session;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_documents).post(upload_document))
        .route("/{id}", get(get_document).delete(delete_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    assistant_id: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
}

async fn list_documents(
    session: Session,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    let documents = session
        .proxy()?
        .list_documents(query.assistant_id.as_deref(), query.thread_id.as_deref())
        .await?;
    Ok(data(documents))
}

async fn get_document(session: Session, Path(id): Path<String>) -> ApiResult<Json<Document>> {
    Ok(Json(session.proxy()?.get_document(&id).await?))
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<FileUpload>,
    assistant_id: Option<String>,
    thread_id: Option<String>,
    details: DocumentCreate,
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Multipart error: {err}"))
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some(FileUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "assistant_id" => {
                form.assistant_id = Some(field.text().await.map_err(multipart_error)?);
            }
            "thread_id" => form.thread_id = Some(field.text().await.map_err(multipart_error)?),
            "name" => form.details.name = Some(field.text().await.map_err(multipart_error)?),
            "type" => form.details.kind = Some(field.text().await.map_err(multipart_error)?),
            "metadata" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let metadata: Metadata = serde_json::from_str(&text).map_err(|err| {
                        ApiError::bad_request(format!("metadata must be a JSON object: {err}"))
                    })?;
                    form.details.metadata = Some(metadata);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn upload_document(
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let form = read_form(multipart).await?;
    let Some(mut file) = form.file else {
        return Err(ApiError::bad_request("File is required"));
    };
    let display_name = form.details.name.as_deref().map(str::trim);
    if let Some(name) = display_name.filter(|name| !name.is_empty()) {
        file.filename = name.to_string();
    }

    let target = DocumentTarget::resolve(form.assistant_id.as_deref(), form.thread_id.as_deref());
    let document = session
        .proxy()?
        .upload_document(target, &form.details, file)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn delete_document(session: Session, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    session.proxy()?.delete_document(&id).await?;
    Ok(success())
}
