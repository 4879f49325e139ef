use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use crate::application::{FilterTranslator, VectorStoreCollection};
use crate::domain::{
    CollectionDefinition, DomainError, GetRecordOptions, PropertyType, Record, RecordKey,
    VectorSearchQuery, VectorSearchResults,
};

use super::client::{WeaviateClient, WEAVIATE_STORE_NAME};
use super::query_builder::{build_class_schema, build_search_query, single_vector_field};
use super::{WeaviateFilterTranslator, WeaviateRecordMapper};

/// Weaviate class names start with an uppercase letter.
pub fn class_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A Weaviate class exposed as a vector store collection.
pub struct WeaviateCollection {
    client: WeaviateClient,
    class: String,
    definition: CollectionDefinition,
    named_vectors: bool,
    mapper: WeaviateRecordMapper,
}

impl WeaviateCollection {
    pub fn new(
        client: WeaviateClient,
        name: &str,
        definition: CollectionDefinition,
        named_vectors: bool,
    ) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::invalid_input("collection name cannot be empty"));
        }
        if definition.key_field().property_type() != &PropertyType::String {
            return Err(DomainError::invalid_model(
                "Weaviate keys are UUID strings; the key field must be a string",
            ));
        }
        if !named_vectors {
            single_vector_field(&definition)?;
        }
        let class = class_name(name);
        Ok(Self {
            mapper: WeaviateRecordMapper::new(class.clone(), named_vectors),
            client,
            class,
            definition,
            named_vectors,
        })
    }

    pub fn named_vectors(&self) -> bool {
        self.named_vectors
    }

    fn object_path(&self, key: &RecordKey) -> Result<String, DomainError> {
        let id = WeaviateRecordMapper::object_id(Some(key))?;
        Ok(format!("/v1/objects/{}/{id}", self.class))
    }
}

#[async_trait]
impl VectorStoreCollection for WeaviateCollection {
    fn name(&self) -> &str {
        &self.class
    }

    fn definition(&self) -> &CollectionDefinition {
        &self.definition
    }

    async fn collection_exists(&self) -> Result<bool, DomainError> {
        let path = format!("/v1/schema/{}", self.class);
        let found = self
            .client
            .send(Method::GET, &path, None, &self.class, "collection_exists")
            .await?;
        Ok(found.is_some())
    }

    async fn ensure_collection_exists(&self) -> Result<(), DomainError> {
        if self.collection_exists().await? {
            return Ok(());
        }
        let schema = build_class_schema(&self.class, &self.definition, self.named_vectors)?;
        self.client
            .send(Method::POST, "/v1/schema", Some(&schema), &self.class, "create_collection")
            .await?;
        debug!("Created Weaviate class {}", self.class);
        Ok(())
    }

    async fn ensure_collection_deleted(&self) -> Result<(), DomainError> {
        let path = format!("/v1/schema/{}", self.class);
        self.client
            .send(Method::DELETE, &path, None, &self.class, "delete_collection")
            .await?;
        debug!("Deleted Weaviate class {}", self.class);
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<Vec<RecordKey>, DomainError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::with_capacity(records.len());
        let mut objects = Vec::with_capacity(records.len());
        for record in records {
            let (id, object) = self.mapper.to_object(record, &self.definition)?;
            keys.push(RecordKey::String(id.to_string()));
            objects.push(object);
        }

        let body = json!({ "objects": objects });
        let response = self
            .client
            .send(Method::POST, "/v1/batch/objects", Some(&body), &self.class, "upsert")
            .await?
            .unwrap_or(Value::Null);

        let errors = batch_errors(&response);
        if !errors.is_empty() {
            return Err(DomainError::operation(
                WEAVIATE_STORE_NAME,
                &self.class,
                "upsert",
                errors.join("; "),
            ));
        }

        debug!("Upserted {} objects into Weaviate class {}", keys.len(), self.class);
        Ok(keys)
    }

    async fn get(
        &self,
        keys: &[RecordKey],
        options: &GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError> {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let mut path = self.object_path(key)?;
            if options.include_vectors {
                path.push_str("?include=vector");
            }
            let Some(object) = self
                .client
                .send(Method::GET, &path, None, &self.class, "get")
                .await?
            else {
                continue;
            };
            records.push(
                self.mapper
                    .from_object(&object, &self.definition, options.include_vectors)?,
            );
        }
        debug!("Fetched {} of {} objects from {}", records.len(), keys.len(), self.class);
        Ok(records)
    }

    async fn delete(&self, keys: &[RecordKey]) -> Result<(), DomainError> {
        for key in keys {
            let path = self.object_path(key)?;
            self.client
                .send(Method::DELETE, &path, None, &self.class, "delete")
                .await?;
        }
        debug!("Deleted {} objects from {}", keys.len(), self.class);
        Ok(())
    }

    async fn search(&self, query: &VectorSearchQuery) -> Result<VectorSearchResults, DomainError> {
        let options = &query.options;
        options.validate()?;
        if query.vector.is_empty() {
            return Err(DomainError::search("No vector provided for the search"));
        }
        let vector_field = self
            .definition
            .try_get_vector_field(options.vector_property.as_deref())?
            .ok_or_else(|| DomainError::search("The collection has no vector field to search"))?;

        let where_filter = match &options.filter {
            Some(filter) => Some(WeaviateFilterTranslator.translate(filter, &self.definition)?),
            None => None,
        };
        let graphql = build_search_query(
            &self.class,
            &self.definition,
            query,
            vector_field,
            self.named_vectors,
            where_filter.as_deref(),
        );
        debug!("Weaviate query: {graphql}");

        let body = json!({ "query": graphql });
        let response = self
            .client
            .send(Method::POST, "/v1/graphql", Some(&body), &self.class, "search")
            .await?
            .unwrap_or(Value::Null);

        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                return Err(DomainError::search(format!(
                    "Weaviate search failed: {}",
                    messages.join("; ")
                )));
            }
        }

        let items = response
            .pointer(&format!("/data/Get/{}", self.class))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let results = items
            .iter()
            .map(|item| {
                self.mapper
                    .from_graphql(item, &self.definition, options.include_vectors)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Weaviate search on {} returned {} results", self.class, results.len());
        let total_count = options.include_total_count.then_some(results.len());
        Ok(VectorSearchResults {
            results,
            total_count,
        })
    }
}

fn batch_errors(response: &Value) -> Vec<String> {
    let Some(items) = response.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.pointer("/result/errors/error").and_then(Value::as_array))
        .flatten()
        .filter_map(|e| e.get("message").and_then(Value::as_str).map(String::from))
        .collect()
}
