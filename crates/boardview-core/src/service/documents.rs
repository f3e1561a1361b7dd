use boardview_models::{Document, DocumentCreate, DocumentTarget, FileUpload, decode_documents};
use tracing::info;

use super::{ProxyService, decode_one};
use crate::error::{Result, ServiceError, require};

impl ProxyService {
    /// Documents attached to an assistant (preferred) or a thread. With
    /// neither id there is nothing to list.
    pub async fn list_documents(
        &self,
        assistant_id: Option<&str>,
        thread_id: Option<&str>,
    ) -> Result<Vec<Document>> {
        let Some(target) = DocumentTarget::resolve(assistant_id, thread_id) else {
            return Ok(Vec::new());
        };
        let raw = self.client.list_documents(&target).await?;
        Ok(decode_documents(&raw))
    }

    /// Document status as reported by the platform.
    pub async fn get_document(&self, document_id: &str) -> Result<Document> {
        let document_id = require(Some(document_id), "document_id")?;
        let raw = self.client.get_document(document_id).await?;
        decode_one(&raw, Document::decode)
    }

    /// Upload `file` to `target`. Fields the platform leaves out of its
    /// answer are filled from `details`.
    pub async fn upload_document(
        &self,
        target: Option<DocumentTarget>,
        details: &DocumentCreate,
        file: FileUpload,
    ) -> Result<Document> {
        let target = target.ok_or_else(|| {
            ServiceError::Validation("assistant_id or thread_id is required".to_string())
        })?;
        if file.filename.trim().is_empty() {
            return Err(ServiceError::Validation("No file provided".to_string()));
        }

        let size = file.bytes.len();
        let raw = self.client.upload_document(&target, file).await?;
        let mut document = decode_one(&raw, Document::decode)?;
        if document.kind.is_none() {
            document.kind = details.kind.clone();
        }
        if document.metadata.is_none() {
            document.metadata = details.metadata.clone();
        }
        info!(document_id = ?document.id, ?target, size, "Uploaded document");
        Ok(document)
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let document_id = require(Some(document_id), "document_id")?;
        self.client.delete_document(document_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_service;
    use boardview_remote::InMemoryPlatform;

    fn upload(name: &str) -> FileUpload {
        FileUpload {
            filename: name.to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_list_without_target_is_empty() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");

        assert!(service.list_documents(None, None).await.unwrap().is_empty());
        assert_eq!(platform.calls("list_documents"), 0);
    }

    #[tokio::test]
    async fn test_upload_requires_target() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");

        let err = service
            .upload_document(None, &DocumentCreate::default(), upload("a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_list_status_delete() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");
        let target = DocumentTarget::Thread("t-1".to_string());

        let document = service
            .upload_document(Some(target), &DocumentCreate::default(), upload("notes.txt"))
            .await
            .unwrap();
        assert_eq!(document.name, "notes.txt");
        assert_eq!(document.size, Some(5));
        let id = document.id.unwrap();

        let listed = service.list_documents(None, Some("t-1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(service.list_documents(Some("a-1"), None).await.unwrap().is_empty());

        let status = service.get_document(&id).await.unwrap();
        assert_eq!(status.status.as_deref(), Some("pending"));

        service.delete_document(&id).await.unwrap();
        assert!(service.list_documents(None, Some("t-1")).await.unwrap().is_empty());
    }
}
