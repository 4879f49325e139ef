use std::sync::Arc;

use tracing::info;

use crate::application::VectorStore;
use crate::domain::{CollectionDefinition, DomainError};

pub struct ManageCollectionsUseCase {
    store: Arc<dyn VectorStore>,
}

impl ManageCollectionsUseCase {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<String>, DomainError> {
        self.store.list_collection_names().await
    }

    pub async fn exists(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<bool, DomainError> {
        self.store.collection(name, definition)?.collection_exists().await
    }

    /// Creates the collection unless it already exists.
    pub async fn create(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<(), DomainError> {
        let collection = self.store.collection(name, definition)?;
        collection.ensure_collection_exists().await?;
        info!("Collection {} ready in {}", collection.name(), self.store.store_name());
        Ok(())
    }

    pub async fn drop_collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<(), DomainError> {
        let collection = self.store.collection(name, definition)?;
        collection.ensure_collection_deleted().await?;
        info!("Collection {} dropped from {}", collection.name(), self.store.store_name());
        Ok(())
    }
}
