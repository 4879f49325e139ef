use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{
    vector_from_value, vector_to_value, CollectionDefinition, DomainError, Record, RecordKey,
    VectorSearchResult,
};

use super::query_builder::DEFAULT_VECTOR_NAME;

/// Converts records to and from Weaviate objects.
#[derive(Debug, Clone)]
pub struct WeaviateRecordMapper {
    class: String,
    named_vectors: bool,
}

impl WeaviateRecordMapper {
    pub fn new(class: impl Into<String>, named_vectors: bool) -> Self {
        Self {
            class: class.into(),
            named_vectors,
        }
    }

    /// Weaviate ids are UUIDs. A record without a key gets a fresh v4 id.
    pub fn object_id(key: Option<&RecordKey>) -> Result<Uuid, DomainError> {
        match key {
            None => Ok(Uuid::new_v4()),
            Some(RecordKey::String(s)) => Uuid::parse_str(s)
                .map_err(|_| {
                    DomainError::invalid_input(format!("Weaviate keys must be UUIDs, got '{s}'"))
                }),
            Some(RecordKey::Int(i)) => Err(DomainError::invalid_input(format!(
                "Weaviate keys must be UUIDs, got integer {i}"
            ))),
        }
    }

    /// REST object for `POST /v1/batch/objects`.
    pub fn to_object(
        &self,
        record: &Record,
        definition: &CollectionDefinition,
    ) -> Result<(Uuid, Value), DomainError> {
        let id = Self::object_id(record.key())?;

        let mut properties = Map::new();
        for field in definition.data_fields() {
            if let Some(value) = record.data.get(field.name()) {
                properties.insert(field.storage_name().to_string(), value.clone());
            }
        }

        let mut object = Map::new();
        object.insert("class".into(), Value::String(self.class.clone()));
        object.insert("id".into(), Value::String(id.to_string()));
        object.insert("properties".into(), Value::Object(properties));

        if self.named_vectors {
            let mut vectors = Map::new();
            for field in definition.vector_fields() {
                if let Some(vector) = record.vector(field.name()) {
                    vectors.insert(field.storage_name().to_string(), vector_to_value(vector));
                }
            }
            if !vectors.is_empty() {
                object.insert("vectors".into(), Value::Object(vectors));
            }
        } else if let Some(field) = definition.vector_fields().next() {
            if let Some(vector) = record.vector(field.name()) {
                object.insert("vector".into(), vector_to_value(vector));
            }
        }

        Ok((id, Value::Object(object)))
    }

    /// Record from a REST object as returned by `GET /v1/objects/{class}/{id}`.
    pub fn from_object(
        &self,
        object: &Value,
        definition: &CollectionDefinition,
        include_vectors: bool,
    ) -> Result<Record, DomainError> {
        let id = object
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::mapping("Weaviate object has no id"))?;
        let properties = object.get("properties").and_then(Value::as_object);

        let mut record = Record::new(id);
        if let Some(properties) = properties {
            self.read_properties(properties, definition, &mut record);
        }
        if include_vectors {
            let vectors = if self.named_vectors {
                object.get("vectors")
            } else {
                object.get("vector")
            };
            self.read_vectors(vectors, definition, &mut record)?;
        }
        Ok(record)
    }

    /// Record and score from one entry of a GraphQL `Get` result.
    pub fn from_graphql(
        &self,
        item: &Value,
        definition: &CollectionDefinition,
        include_vectors: bool,
    ) -> Result<VectorSearchResult, DomainError> {
        let object = item
            .as_object()
            .ok_or_else(|| DomainError::mapping("GraphQL result entry is not an object"))?;
        let additional = object.get("_additional").and_then(Value::as_object);

        let id = additional
            .and_then(|a| a.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::mapping("GraphQL result has no _additional.id"))?;

        let mut record = Record::new(id);
        self.read_properties(object, definition, &mut record);

        if include_vectors {
            let vectors = additional.and_then(|a| {
                if self.named_vectors {
                    a.get("vectors")
                } else {
                    a.get("vector")
                }
            });
            self.read_vectors(vectors, definition, &mut record)?;
        }

        let score = additional.and_then(|a| {
            score_value(a.get("score")).or_else(|| score_value(a.get("distance")))
        });
        Ok(VectorSearchResult::new(record, score))
    }

    fn read_properties(
        &self,
        properties: &Map<String, Value>,
        definition: &CollectionDefinition,
        record: &mut Record,
    ) {
        for field in definition.data_fields() {
            if let Some(value) = properties.get(field.storage_name()) {
                record.data.insert(field.name().to_string(), value.clone());
            }
        }
    }

    fn read_vectors(
        &self,
        vectors: Option<&Value>,
        definition: &CollectionDefinition,
        record: &mut Record,
    ) -> Result<(), DomainError> {
        let Some(vectors) = vectors.filter(|v| !v.is_null()) else {
            return Ok(());
        };
        if self.named_vectors {
            let Some(named) = vectors.as_object() else {
                return Err(DomainError::mapping("named vectors must be an object"));
            };
            for field in definition.vector_fields() {
                if let Some(value) = named.get(field.storage_name()) {
                    let vector = vector_from_value(value).map_err(DomainError::mapping)?;
                    record.vectors.insert(field.name().to_string(), vector);
                }
            }
        } else if let Some(field) = definition.vector_fields().next() {
            // Older servers nest the unnamed vector under "default".
            let value = vectors.get(DEFAULT_VECTOR_NAME).unwrap_or(vectors);
            let vector = vector_from_value(value).map_err(DomainError::mapping)?;
            record.vectors.insert(field.name().to_string(), vector);
        }
        Ok(())
    }
}

/// Hybrid scores come back as strings.
fn score_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
