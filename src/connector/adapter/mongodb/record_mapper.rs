use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Number, Value};

use crate::domain::{CollectionDefinition, DomainError, Record, RecordKey, VectorSearchResult};

pub const KEY_FIELD: &str = "_id";
pub const SCORE_FIELD: &str = "score";

/// Converts plain JSON into BSON. Integers become `Int64`, other numbers `Double`.
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            let mut document = Document::new();
            for (k, v) in map {
                document.insert(k.clone(), json_to_bson(v));
            }
            Bson::Document(document)
        }
    }
}

/// Converts BSON back to plain JSON. Object ids become hex strings; anything
/// without a plain JSON form falls back to relaxed extended JSON.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(document) => {
            let mut map = Map::new();
            for (k, v) in document {
                map.insert(k.clone(), bson_to_json(v));
            }
            Value::Object(map)
        }
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Only the lowercase hex form maps to an object id, since that is the form
/// object ids are read back as.
fn object_id_from_key(key: &str) -> Option<ObjectId> {
    let is_hex = key.len() == 24 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if is_hex {
        ObjectId::parse_str(key).ok()
    } else {
        None
    }
}

fn key_to_bson(key: &RecordKey) -> Bson {
    match key {
        RecordKey::String(s) => match object_id_from_key(s) {
            Some(oid) => Bson::ObjectId(oid),
            None => Bson::String(s.clone()),
        },
        RecordKey::Int(i) => Bson::Int64(*i),
    }
}

/// `_id` values to match for the given keys. A hex key matches both an
/// object id and a plain string `_id`.
pub fn keys_to_bson(keys: &[RecordKey]) -> Vec<Bson> {
    let mut ids = Vec::with_capacity(keys.len());
    for key in keys {
        let id = key_to_bson(key);
        if let (Bson::ObjectId(_), RecordKey::String(s)) = (&id, key) {
            ids.push(Bson::String(s.clone()));
        }
        ids.push(id);
    }
    ids
}

fn key_from_bson(value: &Bson) -> Result<RecordKey, DomainError> {
    match value {
        Bson::String(s) => Ok(RecordKey::String(s.clone())),
        Bson::ObjectId(oid) => Ok(RecordKey::String(oid.to_hex())),
        Bson::Int64(i) => Ok(RecordKey::Int(*i)),
        Bson::Int32(i) => Ok(RecordKey::Int(i64::from(*i))),
        other => Err(DomainError::mapping(format!(
            "unsupported _id type {:?}",
            other.element_type()
        ))),
    }
}

fn vector_from_bson(value: &Bson) -> Result<Vec<f32>, DomainError> {
    let Bson::Array(items) = value else {
        return Err(DomainError::mapping("vector must be an array"));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Double(f) => Ok(*f as f32),
            Bson::Int32(i) => Ok(*i as f32),
            Bson::Int64(i) => Ok(*i as f32),
            other => Err(DomainError::mapping(format!(
                "vector element {other} is not a number"
            ))),
        })
        .collect()
}

/// Converts records to and from MongoDB documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDbRecordMapper;

impl MongoDbRecordMapper {
    /// Returns the stored key alongside the document. Records without a key
    /// get a new object id, reported in hex form.
    pub fn to_document(
        &self,
        record: &Record,
        definition: &CollectionDefinition,
    ) -> (RecordKey, Document) {
        let key = match record.key() {
            Some(key) => key.clone(),
            None => RecordKey::String(ObjectId::new().to_hex()),
        };

        let mut document = Document::new();
        document.insert(KEY_FIELD, key_to_bson(&key));
        for field in definition.data_fields() {
            if let Some(value) = record.data.get(field.name()) {
                document.insert(field.storage_name(), json_to_bson(value));
            }
        }
        for field in definition.vector_fields() {
            if let Some(vector) = record.vector(field.name()) {
                let values: Vec<Bson> = vector.iter().map(|v| Bson::Double(*v as f64)).collect();
                document.insert(field.storage_name(), values);
            }
        }
        (key, document)
    }

    pub fn from_document(
        &self,
        document: &Document,
        definition: &CollectionDefinition,
        include_vectors: bool,
    ) -> Result<Record, DomainError> {
        let key = document
            .get(KEY_FIELD)
            .ok_or_else(|| DomainError::mapping("document has no _id"))?;

        let mut record = Record {
            key: Some(key_from_bson(key)?),
            ..Default::default()
        };
        for field in definition.data_fields() {
            if let Some(value) = document.get(field.storage_name()) {
                record.data.insert(field.name().to_string(), bson_to_json(value));
            }
        }
        if include_vectors {
            for field in definition.vector_fields() {
                if let Some(value) = document.get(field.storage_name()) {
                    record
                        .vectors
                        .insert(field.name().to_string(), vector_from_bson(value)?);
                }
            }
        }
        Ok(record)
    }

    pub fn from_search_document(
        &self,
        document: &Document,
        definition: &CollectionDefinition,
        include_vectors: bool,
    ) -> Result<VectorSearchResult, DomainError> {
        let record = self.from_document(document, definition, include_vectors)?;
        let score = match document.get(SCORE_FIELD) {
            Some(Bson::Double(f)) => Some(*f),
            Some(Bson::Int32(i)) => Some(f64::from(*i)),
            Some(Bson::Int64(i)) => Some(*i as f64),
            _ => None,
        };
        Ok(VectorSearchResult::new(record, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PropertyType, VectorStoreField};
    use mongodb::bson::doc;
    use serde_json::json;

    fn definition() -> CollectionDefinition {
        CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("name", PropertyType::String).with_storage_name("hotelName"),
            VectorStoreField::data("address", PropertyType::Json),
            VectorStoreField::vector("embedding", 2),
        ])
        .unwrap()
    }

    #[test]
    fn record_maps_to_document_with_id() {
        let record = Record::new("h1")
            .with_data("name", "Grand")
            .with_data("address", json!({"city": "Rome", "floor": 3}))
            .with_vector("embedding", vec![0.5, 1.0]);
        let (key, document) = MongoDbRecordMapper.to_document(&record, &definition());

        assert_eq!(key, RecordKey::from("h1"));
        assert_eq!(
            document,
            doc! {
                "_id": "h1",
                "hotelName": "Grand",
                "address": { "city": "Rome", "floor": 3_i64 },
                "embedding": [0.5, 1.0],
            }
        );
    }

    #[test]
    fn missing_key_gets_an_object_id() {
        let (key, document) = MongoDbRecordMapper.to_document(&Record::default(), &definition());
        let hex = key.as_str().unwrap().to_string();
        assert_eq!(hex.len(), 24);
        assert_eq!(document.get_object_id("_id").unwrap().to_hex(), hex);
    }

    #[test]
    fn object_id_keys_round_trip() {
        let oid = ObjectId::parse_str("6ad6b2c3d4e5f60718293a4b").unwrap();
        let stored = doc! { "_id": oid, "hotelName": "Grand" };
        let record = MongoDbRecordMapper
            .from_document(&stored, &definition(), false)
            .unwrap();
        let key = record.key.clone().unwrap();
        assert_eq!(key, RecordKey::from("6ad6b2c3d4e5f60718293a4b"));

        let ids = keys_to_bson(&[key]);
        assert!(ids.contains(&Bson::ObjectId(oid)));
        assert!(ids.contains(&Bson::String(oid.to_hex())));

        let (_, document) = MongoDbRecordMapper.to_document(&record, &definition());
        assert_eq!(document.get("_id"), Some(&Bson::ObjectId(oid)));

        let upper = RecordKey::from("6AD6B2C3D4E5F60718293A4B");
        let ids = keys_to_bson(&[upper, RecordKey::from(4i64)]);
        assert_eq!(
            ids,
            vec![Bson::String("6AD6B2C3D4E5F60718293A4B".into()), Bson::Int64(4)]
        );
    }

    #[test]
    fn search_document_maps_back_with_score() {
        let document = doc! {
            "_id": ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap(),
            "hotelName": "Grand",
            "embedding": [1, 2.5],
            "score": 0.91,
        };
        let result = MongoDbRecordMapper
            .from_search_document(&document, &definition(), true)
            .unwrap();

        assert_eq!(result.score, Some(0.91));
        assert_eq!(result.record.key, Some(RecordKey::from("65a1b2c3d4e5f60718293a4b")));
        assert_eq!(result.record.data["name"], json!("Grand"));
        assert_eq!(result.record.vector("embedding"), Some(&[1.0f32, 2.5][..]));
    }

    #[test]
    fn bson_values_convert_to_plain_json() {
        assert_eq!(bson_to_json(&Bson::Int32(3)), json!(3));
        assert_eq!(bson_to_json(&Bson::Double(f64::NAN)), Value::Null);
        assert_eq!(json_to_bson(&json!(2)), Bson::Int64(2));
        assert_eq!(json_to_bson(&json!(2.5)), Bson::Double(2.5));
    }
}
