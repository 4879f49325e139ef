use std::sync::Arc;

use tracing::info;

use crate::application::VectorStore;
use crate::domain::{CollectionDefinition, DomainError, GetRecordOptions, Record, RecordKey};

/// Point reads and deletes by key.
pub struct GetRecordsUseCase {
    store: Arc<dyn VectorStore>,
}

impl GetRecordsUseCase {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        name: &str,
        definition: CollectionDefinition,
        keys: &[RecordKey],
        options: GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError> {
        let collection = self.store.collection(name, definition)?;
        collection.get(keys, &options).await
    }

    pub async fn delete(
        &self,
        name: &str,
        definition: CollectionDefinition,
        keys: &[RecordKey],
    ) -> Result<(), DomainError> {
        let collection = self.store.collection(name, definition)?;
        collection.delete(keys).await?;
        info!("Deleted {} keys from {}", keys.len(), collection.name());
        Ok(())
    }
}
