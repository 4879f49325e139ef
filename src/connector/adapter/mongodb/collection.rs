use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};
use tracing::debug;

use crate::application::{FilterTranslator, VectorStoreCollection};
use crate::domain::{
    CollectionDefinition, DomainError, GetRecordOptions, OperationContext, Record, RecordKey,
    SearchType, VectorSearchQuery, VectorSearchResults,
};

use super::query_builder::{build_create_index_command, build_projection, build_search_pipeline};
use super::record_mapper::{keys_to_bson, KEY_FIELD};
use super::{MongoDbFilterTranslator, MongoDbRecordMapper};

pub(crate) const MONGODB_STORE_NAME: &str = "MongoDB";

/// A MongoDB Atlas collection searched through a `vectorSearch` index.
pub struct MongoDbCollection {
    database: Database,
    collection: Collection<Document>,
    name: String,
    index_name: String,
    definition: CollectionDefinition,
    mapper: MongoDbRecordMapper,
}

impl MongoDbCollection {
    pub fn new(
        database: Database,
        name: &str,
        index_name: &str,
        definition: CollectionDefinition,
    ) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::invalid_input("collection name cannot be empty"));
        }
        Ok(Self {
            collection: database.collection::<Document>(name),
            database,
            name: name.to_string(),
            index_name: index_name.to_string(),
            definition,
            mapper: MongoDbRecordMapper,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn id_filter(keys: &[RecordKey]) -> Document {
        doc! { "_id": { "$in": keys_to_bson(keys) } }
    }
}

#[async_trait]
impl VectorStoreCollection for MongoDbCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> &CollectionDefinition {
        &self.definition
    }

    async fn collection_exists(&self) -> Result<bool, DomainError> {
        let names = self
            .database
            .list_collection_names()
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "collection_exists")?;
        Ok(names.iter().any(|n| n == &self.name))
    }

    async fn ensure_collection_exists(&self) -> Result<(), DomainError> {
        if self.collection_exists().await? {
            return Ok(());
        }
        let command = build_create_index_command(&self.name, &self.index_name, &self.definition)?;

        self.database
            .create_collection(&self.name)
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "create_collection")?;
        self.database
            .run_command(command)
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "create_search_index")?;

        debug!("Created MongoDB collection {} with index {}", self.name, self.index_name);
        Ok(())
    }

    async fn ensure_collection_deleted(&self) -> Result<(), DomainError> {
        self.collection
            .drop()
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "delete_collection")?;
        debug!("Dropped MongoDB collection {}", self.name);
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<Vec<RecordKey>, DomainError> {
        let mut keys = Vec::with_capacity(records.len());
        for record in records {
            let (key, document) = self.mapper.to_document(record, &self.definition);
            let selector = doc! { "_id": document.get(KEY_FIELD).cloned() };
            self.collection
                .replace_one(selector, document)
                .upsert(true)
                .await
                .in_operation(MONGODB_STORE_NAME, &self.name, "upsert")?;
            keys.push(key);
        }
        debug!("Upserted {} documents into {}", keys.len(), self.name);
        Ok(keys)
    }

    async fn get(
        &self,
        keys: &[RecordKey],
        options: &GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(Self::id_filter(keys))
            .projection(build_projection(&self.definition, options.include_vectors))
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "get")?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "get")?;

        let records = documents
            .iter()
            .map(|d| {
                self.mapper
                    .from_document(d, &self.definition, options.include_vectors)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Fetched {} of {} documents from {}", records.len(), keys.len(), self.name);
        Ok(records)
    }

    async fn delete(&self, keys: &[RecordKey]) -> Result<(), DomainError> {
        if keys.is_empty() {
            return Ok(());
        }
        let result = self
            .collection
            .delete_many(Self::id_filter(keys))
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "delete")?;
        debug!("Deleted {} documents from {}", result.deleted_count, self.name);
        Ok(())
    }

    async fn search(&self, query: &VectorSearchQuery) -> Result<VectorSearchResults, DomainError> {
        let options = &query.options;
        options.validate()?;
        if query.search_type() == SearchType::KeywordHybrid {
            return Err(DomainError::search(
                "Keyword hybrid search is not supported by MongoDB Atlas",
            ));
        }
        if query.vector.is_empty() {
            return Err(DomainError::search("No vector provided for the search"));
        }
        let vector_field = self
            .definition
            .try_get_vector_field(options.vector_property.as_deref())?
            .ok_or_else(|| DomainError::search("The collection has no vector field to search"))?;

        let filter = match &options.filter {
            Some(filter) => Some(MongoDbFilterTranslator.translate(filter, &self.definition)?),
            None => None,
        };
        let pipeline =
            build_search_pipeline(&self.index_name, &self.definition, query, vector_field, filter);

        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "search")?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .in_operation(MONGODB_STORE_NAME, &self.name, "search")?;

        let results = documents
            .iter()
            .map(|d| {
                self.mapper
                    .from_search_document(d, &self.definition, options.include_vectors)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("MongoDB search on {} returned {} results", self.name, results.len());

        let total_count = options.include_total_count.then_some(results.len());
        Ok(VectorSearchResults {
            results,
            total_count,
        })
    }
}
