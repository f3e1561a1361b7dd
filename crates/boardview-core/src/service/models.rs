use boardview_models::ModelInfo;

use super::ProxyService;

impl ProxyService {
    pub async fn list_models(&self) -> Vec<ModelInfo> {
        self.catalog.models(self.client.as_ref()).await
    }

    /// Catalog entry for `model_id`, or a bare stub when the catalog does
    /// not list it.
    pub async fn get_model_info(&self, model_id: &str) -> ModelInfo {
        self.list_models()
            .await
            .into_iter()
            .find(|model| model.id == model_id)
            .unwrap_or_else(|| ModelInfo::stub(model_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::service::test_service;
    use boardview_remote::InMemoryPlatform;
    use serde_json::json;

    #[tokio::test]
    async fn test_model_info_falls_back_to_stub() {
        let platform = InMemoryPlatform::new();
        platform.insert_model(
            json!({"name": "gpt-4o", "provider": "openai", "context_limit": 128000}),
        );
        let service = test_service(&platform, "key");

        let known = service.get_model_info("gpt-4o").await;
        assert_eq!(known.provider.as_deref(), Some("openai"));
        assert_eq!(known.max_tokens, Some(128000));

        let unknown = service.get_model_info("mystery").await;
        assert_eq!(unknown.id, "mystery");
        assert_eq!(unknown.name, "mystery");
        assert!(unknown.provider.is_none());
    }
}
