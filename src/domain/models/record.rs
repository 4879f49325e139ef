use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{CollectionDefinition, DomainError, FieldKind, PropertyType};

/// Key of a record. Stores accept either string or integer keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    String(String),
}

impl RecordKey {
    /// Parse a key given on the command line according to the key field type.
    pub fn parse(raw: &str, key_type: &PropertyType) -> Result<Self, DomainError> {
        match key_type {
            PropertyType::Int => raw
                .parse::<i64>()
                .map(RecordKey::Int)
                .map_err(|_| DomainError::invalid_input(format!("'{raw}' is not an integer key"))),
            _ => Ok(RecordKey::String(raw.to_string())),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        match value {
            Value::String(s) => Ok(RecordKey::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(RecordKey::Int)
                .ok_or_else(|| DomainError::mapping(format!("key {n} is not an integer"))),
            other => Err(DomainError::mapping(format!(
                "key must be a string or an integer, got {other}"
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Int(i) => Value::from(*i),
            RecordKey::String(s) => Value::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordKey::String(s) => Some(s),
            RecordKey::Int(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(i) => write!(f, "{i}"),
            RecordKey::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        RecordKey::String(value.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        RecordKey::String(value)
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        RecordKey::Int(value)
    }
}

/// A generic record: a key, data properties and vectors, all keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub key: Option<RecordKey>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub vectors: BTreeMap<String, Vec<f32>>,
}

impl Record {
    pub fn new(key: impl Into<RecordKey>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    pub fn with_vector(mut self, field: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(field.into(), vector);
        self
    }

    pub fn key(&self) -> Option<&RecordKey> {
        self.key.as_ref()
    }

    pub fn vector(&self, field: &str) -> Option<&[f32]> {
        self.vectors.get(field).map(Vec::as_slice)
    }

    /// Build a record from a flat JSON object whose keys are field names
    /// (storage names are accepted too).
    pub fn from_json(
        value: &Value,
        definition: &CollectionDefinition,
    ) -> Result<Self, DomainError> {
        let object = value
            .as_object()
            .ok_or_else(|| DomainError::mapping("record must be a JSON object"))?;

        let mut record = Record::default();
        for (name, value) in object {
            let field = definition
                .field(name)
                .ok_or_else(|| DomainError::UnknownField(name.clone()))?;
            match field.kind() {
                FieldKind::Key => {
                    if value.is_null() {
                        continue;
                    }
                    let key = RecordKey::from_value(value)?;
                    let expected_int = field.property_type() == &PropertyType::Int;
                    if expected_int != matches!(key, RecordKey::Int(_)) {
                        return Err(DomainError::mapping(format!(
                            "key field '{}' is {}, got {value}",
                            field.name(),
                            field.property_type()
                        )));
                    }
                    record.key = Some(key);
                }
                FieldKind::Data => {
                    if !value_has_type(value, field.property_type()) {
                        return Err(DomainError::mapping(format!(
                            "data field '{}' is {}, got {value}",
                            field.name(),
                            field.property_type()
                        )));
                    }
                    record.data.insert(field.name().to_string(), value.clone());
                }
                FieldKind::Vector => {
                    if value.is_null() {
                        continue;
                    }
                    let vector = vector_from_value(value).map_err(|e| {
                        DomainError::mapping(format!("vector field '{}': {e}", field.name()))
                    })?;
                    record.vectors.insert(field.name().to_string(), vector);
                }
            }
        }
        Ok(record)
    }

    /// Render the record as a flat JSON object keyed by field name.
    pub fn to_json(&self, definition: &CollectionDefinition) -> Value {
        let mut object = Map::new();
        if let Some(key) = &self.key {
            object.insert(definition.key_field().name().to_string(), key.to_value());
        }
        for field in definition.data_fields() {
            if let Some(value) = self.data.get(field.name()) {
                object.insert(field.name().to_string(), value.clone());
            }
        }
        for field in definition.vector_fields() {
            if let Some(vector) = self.vectors.get(field.name()) {
                object.insert(field.name().to_string(), vector_to_value(vector));
            }
        }
        Value::Object(object)
    }
}

/// Null fits every type. Json, Bytes and DateTime values are passed on to the
/// store as given.
fn value_has_type(value: &Value, property_type: &PropertyType) -> bool {
    match (property_type, value) {
        (_, Value::Null) => true,
        (PropertyType::String, v) => v.is_string(),
        (PropertyType::Int, v) => v.is_i64() || v.is_u64(),
        (PropertyType::Float, v) => v.is_number(),
        (PropertyType::Bool, v) => v.is_boolean(),
        (PropertyType::DateTime, v) => v.is_string(),
        (PropertyType::Json | PropertyType::Bytes, _) => true,
        (PropertyType::List(inner), Value::Array(items)) => {
            items.iter().all(|item| value_has_type(item, inner))
        }
        (PropertyType::List(_), _) => false,
    }
}

pub fn vector_from_value(value: &Value) -> Result<Vec<f32>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected an array of numbers, got {value}"))?;
    items
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("'{item}' is not a number"))
        })
        .collect()
}

pub fn vector_to_value(vector: &[f32]) -> Value {
    Value::Array(vector.iter().map(|v| Value::from(*v as f64)).collect())
}
