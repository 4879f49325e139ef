use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::application::{EmbeddingService, VectorStore};
use crate::domain::{vector_to_value, CollectionDefinition, DomainError, Record, RecordKey};

/// Writes JSON records into a collection. A vector field given as a string is
/// embedded first.
pub struct UpsertRecordsUseCase {
    store: Arc<dyn VectorStore>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl UpsertRecordsUseCase {
    pub fn new(store: Arc<dyn VectorStore>, embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            store,
            embedding_service,
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        definition: CollectionDefinition,
        values: Vec<Value>,
    ) -> Result<Vec<RecordKey>, DomainError> {
        let values = self.embed_text_vectors(&definition, values).await?;
        let records = values
            .iter()
            .map(|value| Record::from_json(value, &definition))
            .collect::<Result<Vec<_>, _>>()?;

        let collection = self.store.collection(name, definition)?;
        let keys = collection.upsert(&records).await?;
        info!("Upserted {} records into {}", keys.len(), collection.name());
        Ok(keys)
    }

    /// Replaces string values of vector fields with their embeddings, using
    /// one batched call.
    async fn embed_text_vectors(
        &self,
        definition: &CollectionDefinition,
        mut values: Vec<Value>,
    ) -> Result<Vec<Value>, DomainError> {
        let mut slots = Vec::new();
        let mut texts = Vec::new();
        for (index, value) in values.iter().enumerate() {
            let Some(object) = value.as_object() else {
                continue;
            };
            for (name, field_value) in object {
                let is_vector = definition.field(name).is_some_and(|f| f.is_vector());
                if let (true, Some(text)) = (is_vector, field_value.as_str()) {
                    slots.push((index, name.clone()));
                    texts.push(text.to_string());
                }
            }
        }
        if texts.is_empty() {
            return Ok(values);
        }

        let vectors = self.embedding_service.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(DomainError::service(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        for ((index, name), vector) in slots.into_iter().zip(vectors) {
            if let Some(expected) = definition.field(&name).and_then(|f| f.dimensions()) {
                if expected != vector.len() {
                    return Err(DomainError::mapping(format!(
                        "vector field '{name}' expects {expected} dimensions but the embedding model produced {}",
                        vector.len()
                    )));
                }
            }
            if let Some(object) = values[index].as_object_mut() {
                object.insert(name, vector_to_value(&vector));
            }
        }
        debug!("Embedded {} text values before upsert", texts.len());
        Ok(values)
    }
}
