use boardview_models::{Assistant, AssistantCreate, AssistantUpdate, decode_assistants};
use tracing::info;

use super::{ProxyService, decode_one};
use crate::error::{Result, ServiceError, require};

impl ProxyService {
    pub async fn list_assistants(&self, skip: usize, limit: usize) -> Result<Vec<Assistant>> {
        let raw = self.client.list_assistants(skip, limit).await?;
        Ok(decode_assistants(&raw))
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let raw = self.client.get_assistant(assistant_id).await?;
        decode_one(&raw, Assistant::decode)
    }

    pub async fn create_assistant(&self, request: &AssistantCreate) -> Result<Assistant> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::missing_field("name"));
        }
        let raw = self.client.create_assistant(request).await?;
        let assistant = decode_one(&raw, Assistant::decode)?;
        info!(assistant_id = ?assistant.id, name = %assistant.name, "Created assistant");
        Ok(assistant)
    }

    pub async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &AssistantUpdate,
    ) -> Result<Assistant> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let raw = self.client.update_assistant(assistant_id, request).await?;
        decode_one(&raw, Assistant::decode)
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        self.client.delete_assistant(assistant_id).await?;
        info!(assistant_id, "Deleted assistant");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ServiceError;
    use crate::service::test_service;
    use boardview_models::{AssistantCreate, AssistantUpdate};
    use boardview_remote::InMemoryPlatform;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");

        let created = service
            .create_assistant(&AssistantCreate::new("Helper").with_system_prompt("Be brief"))
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        let fetched = service.get_assistant(&id).await.unwrap();
        assert_eq!(fetched.name, "Helper");
        assert_eq!(fetched.system_prompt.as_deref(), Some("Be brief"));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");

        let err = service
            .create_assistant(&AssistantCreate::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(platform.calls("create_assistant"), 0);
    }

    #[tokio::test]
    async fn test_listing_drops_nameless_items() {
        let platform = InMemoryPlatform::new();
        platform.insert_raw_assistant("key", json!({"assistant_id": "a-1", "name": "One"}));
        platform.insert_raw_assistant("key", json!({"assistant_id": "a-2"}));
        platform.insert_raw_assistant("key", json!("garbage"));
        let service = test_service(&platform, "key");

        let assistants = service.list_assistants(0, 100).await.unwrap();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].id.as_deref(), Some("a-1"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let platform = InMemoryPlatform::new();
        let service = test_service(&platform, "key");
        let id = service
            .create_assistant(&AssistantCreate::new("Old"))
            .await
            .unwrap()
            .id
            .unwrap();

        let update = AssistantUpdate {
            name: Some("New".to_string()),
            ..AssistantUpdate::default()
        };
        let updated = service.update_assistant(&id, &update).await.unwrap();
        assert_eq!(updated.name, "New");
        assert!(updated.updated_at.is_some());

        service.delete_assistant(&id).await.unwrap();
        assert!(matches!(
            service.get_assistant(&id).await.unwrap_err(),
            ServiceError::Remote(_)
        ));
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let platform = InMemoryPlatform::new();
        test_service(&platform, "alice")
            .create_assistant(&AssistantCreate::new("Mine"))
            .await
            .unwrap();

        let others = test_service(&platform, "bob")
            .list_assistants(0, 100)
            .await
            .unwrap();
        assert!(others.is_empty());
    }
}
