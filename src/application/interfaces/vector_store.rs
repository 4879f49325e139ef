use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    CollectionDefinition, DomainError, GetRecordOptions, Record, RecordKey, VectorSearchQuery,
    VectorSearchResults,
};

/// A single collection in a vector store.
#[async_trait]
pub trait VectorStoreCollection: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> &CollectionDefinition;

    async fn collection_exists(&self) -> Result<bool, DomainError>;

    /// Create the collection and its indexes when missing.
    async fn ensure_collection_exists(&self) -> Result<(), DomainError>;

    async fn ensure_collection_deleted(&self) -> Result<(), DomainError>;

    /// Insert or replace records. Returns the key of every written record, in order.
    async fn upsert(&self, records: &[Record]) -> Result<Vec<RecordKey>, DomainError>;

    /// Fetch records by key. Keys with no stored record are skipped.
    async fn get(
        &self,
        keys: &[RecordKey],
        options: &GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError>;

    async fn delete(&self, keys: &[RecordKey]) -> Result<(), DomainError>;

    async fn search(&self, query: &VectorSearchQuery) -> Result<VectorSearchResults, DomainError>;
}

/// A vector database that hands out typed collections.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn list_collection_names(&self) -> Result<Vec<String>, DomainError>;

    fn collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Arc<dyn VectorStoreCollection>, DomainError>;
}
