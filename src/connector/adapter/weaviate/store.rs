use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::application::{VectorStore, VectorStoreCollection};
use crate::domain::{CollectionDefinition, DomainError};

use super::client::{WeaviateClient, WEAVIATE_STORE_NAME};
use super::{WeaviateCollection, WeaviateSettings};

pub struct WeaviateStore {
    client: WeaviateClient,
    named_vectors: bool,
}

impl WeaviateStore {
    pub fn new(client: WeaviateClient) -> Self {
        Self {
            client,
            named_vectors: true,
        }
    }

    pub fn from_settings(settings: &WeaviateSettings) -> Result<Self, DomainError> {
        let client = WeaviateClient::from_settings(settings)?;
        debug!("Using Weaviate at {}", client.base_url());
        Ok(Self::new(client))
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_settings(&WeaviateSettings::from_env()?)
    }

    /// Store every collection's vector as the class's single unnamed vector.
    pub fn with_named_vectors(mut self, named_vectors: bool) -> Self {
        self.named_vectors = named_vectors;
        self
    }
}

#[async_trait]
impl VectorStore for WeaviateStore {
    fn store_name(&self) -> &'static str {
        WEAVIATE_STORE_NAME
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, DomainError> {
        let schema = self
            .client
            .send(Method::GET, "/v1/schema", None, "", "list_collection_names")
            .await?
            .unwrap_or(Value::Null);
        let names = schema
            .get("classes")
            .and_then(Value::as_array)
            .map(|classes| {
                classes
                    .iter()
                    .filter_map(|c| c.get("class").and_then(Value::as_str).map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    fn collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Arc<dyn VectorStoreCollection>, DomainError> {
        let collection =
            WeaviateCollection::new(self.client.clone(), name, definition, self.named_vectors)?;
        Ok(Arc::new(collection))
    }
}
