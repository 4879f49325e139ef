use serde_json::{Map, Value};
use tiberius::ColumnData;
use uuid::Uuid;

use crate::domain::{
    vector_from_value, vector_to_value, CollectionDefinition, DomainError, FieldKind,
    PropertyType, Record, RecordKey, VectorStoreField,
};

use super::command::SqlParam;
use super::query_builder::{key_param, ordered_fields, SCORE_COLUMN};

/// Converts records to parameter rows and result rows back to records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerRecordMapper;

impl SqlServerRecordMapper {
    /// One parameter per column in key, data, vector order. String keys are
    /// generated when absent; integer keys must be supplied.
    pub fn to_row(
        &self,
        record: &Record,
        definition: &CollectionDefinition,
    ) -> Result<(RecordKey, Vec<SqlParam>), DomainError> {
        let key = match (&record.key, definition.key_field().property_type()) {
            (Some(key), _) => key.clone(),
            (None, PropertyType::String) => RecordKey::String(Uuid::new_v4().to_string()),
            (None, other) => {
                return Err(DomainError::invalid_input(format!(
                    "records need an explicit key for {other} key fields"
                )))
            }
        };

        let mut row = Vec::with_capacity(definition.fields().len());
        for field in ordered_fields(definition) {
            let param = match field.kind() {
                FieldKind::Key => key_param(&key),
                FieldKind::Data => match record.data.get(field.name()) {
                    Some(value) => data_param(field, value)?,
                    None => SqlParam::Null,
                },
                FieldKind::Vector => match record.vector(field.name()) {
                    Some(vector) => SqlParam::String(vector_to_value(vector).to_string()),
                    None => SqlParam::Null,
                },
            };
            row.push(param);
        }
        Ok((key, row))
    }

    /// Builds a record from named result columns. Returns the distance when the
    /// row came from a search.
    pub fn from_columns(
        &self,
        columns: Vec<(String, ColumnData<'static>)>,
        definition: &CollectionDefinition,
        include_vectors: bool,
    ) -> Result<(Record, Option<f64>), DomainError> {
        let mut record = Record::default();
        let mut score = None;
        let mut data = Map::new();

        for (name, value) in columns {
            if name == SCORE_COLUMN {
                score = column_to_value(value)?.as_f64();
                continue;
            }
            let Some(field) = definition.field_by_storage_name(&name) else {
                continue;
            };
            let value = column_to_value(value)?;
            match field.kind() {
                FieldKind::Key => {
                    if !value.is_null() {
                        record.key = Some(RecordKey::from_value(&value)?);
                    }
                }
                FieldKind::Data => {
                    data.insert(field.name().to_string(), decode_data(field, value));
                }
                FieldKind::Vector => {
                    if !include_vectors {
                        continue;
                    }
                    if let Value::String(text) = &value {
                        let parsed: Value = serde_json::from_str(text).map_err(|e| {
                            DomainError::mapping(format!("vector column '{name}': {e}"))
                        })?;
                        let vector = vector_from_value(&parsed).map_err(|e| {
                            DomainError::mapping(format!("vector column '{name}': {e}"))
                        })?;
                        record.vectors.insert(field.name().to_string(), vector);
                    }
                }
            }
        }
        record.data = data;
        Ok((record, score))
    }
}

fn data_param(field: &VectorStoreField, value: &Value) -> Result<SqlParam, DomainError> {
    if value.is_null() {
        return Ok(SqlParam::Null);
    }
    match field.property_type() {
        PropertyType::Json => Ok(SqlParam::String(value.to_string())),
        PropertyType::Bytes => {
            let bytes = value
                .as_array()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                        .collect::<Option<Vec<u8>>>()
                })
                .ok_or_else(|| {
                    DomainError::mapping(format!(
                        "field '{}' expects an array of bytes",
                        field.name()
                    ))
                })?;
            Ok(SqlParam::Bytes(bytes))
        }
        _ => Ok(SqlParam::from_json(value)),
    }
}

/// JSON and list columns come back as text.
fn decode_data(field: &VectorStoreField, value: Value) -> Value {
    match (field.property_type(), &value) {
        (PropertyType::Json | PropertyType::List(_), Value::String(text)) => {
            serde_json::from_str(text).unwrap_or(value)
        }
        _ => value,
    }
}

pub(crate) fn column_to_value(column: ColumnData<'static>) -> Result<Value, DomainError> {
    let value = match column {
        ColumnData::U8(v) => v.map(Value::from),
        ColumnData::I16(v) => v.map(Value::from),
        ColumnData::I32(v) => v.map(Value::from),
        ColumnData::I64(v) => v.map(Value::from),
        ColumnData::F32(v) => v.map(|f| Value::from(f as f64)),
        ColumnData::F64(v) => v.map(Value::from),
        ColumnData::Bit(v) => v.map(Value::from),
        ColumnData::String(v) => v.map(|s| Value::String(s.into_owned())),
        ColumnData::Guid(v) => v.map(|g| Value::String(g.to_string())),
        ColumnData::Binary(v) => {
            v.map(|bytes| Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()))
        }
        other => {
            return Err(DomainError::mapping(format!(
                "unsupported column type {other:?}"
            )))
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::borrow::Cow;

    fn definition() -> CollectionDefinition {
        CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("name", PropertyType::String).with_storage_name("hotel_name"),
            VectorStoreField::data("tags", PropertyType::list_of(PropertyType::String)),
            VectorStoreField::vector("embedding", 2),
        ])
        .unwrap()
    }

    #[test]
    fn rows_follow_column_order() {
        let record = Record::new("h1")
            .with_data("name", "Grand")
            .with_data("tags", json!(["pool"]))
            .with_vector("embedding", vec![0.5, 1.0]);
        let (key, row) = SqlServerRecordMapper.to_row(&record, &definition()).unwrap();

        assert_eq!(key, RecordKey::from("h1"));
        assert_eq!(
            row,
            vec![
                SqlParam::String("h1".into()),
                SqlParam::String("Grand".into()),
                SqlParam::String(r#"["pool"]"#.into()),
                SqlParam::String("[0.5,1.0]".into()),
            ]
        );
    }

    #[test]
    fn missing_string_key_is_generated() {
        let (key, row) = SqlServerRecordMapper
            .to_row(&Record::default(), &definition())
            .unwrap();
        assert!(Uuid::parse_str(key.as_str().unwrap()).is_ok());
        assert_eq!(row[1], SqlParam::Null);
        assert_eq!(row[3], SqlParam::Null);
    }

    #[test]
    fn missing_int_key_is_rejected() {
        let definition = CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::Int),
            VectorStoreField::vector("v", 2),
        ])
        .unwrap();
        assert!(SqlServerRecordMapper.to_row(&Record::default(), &definition).is_err());
    }

    #[test]
    fn columns_map_back_by_storage_name() {
        let columns = vec![
            ("id".to_string(), ColumnData::String(Some(Cow::Owned("h1".into())))),
            ("hotel_name".to_string(), ColumnData::String(Some(Cow::Owned("Grand".into())))),
            ("tags".to_string(), ColumnData::String(Some(Cow::Owned(r#"["pool","spa"]"#.into())))),
            ("embedding".to_string(), ColumnData::String(Some(Cow::Owned("[0.5,1.0]".into())))),
            (SCORE_COLUMN.to_string(), ColumnData::F64(Some(0.25))),
        ];
        let (record, score) = SqlServerRecordMapper
            .from_columns(columns, &definition(), true)
            .unwrap();

        assert_eq!(record.key, Some(RecordKey::from("h1")));
        assert_eq!(record.data["name"], json!("Grand"));
        assert_eq!(record.data["tags"], json!(["pool", "spa"]));
        assert_eq!(record.vector("embedding"), Some(&[0.5f32, 1.0][..]));
        assert_eq!(score, Some(0.25));
    }

    #[test]
    fn null_columns_become_null_data() {
        let columns = vec![
            ("id".to_string(), ColumnData::I64(Some(7))),
            ("hotel_name".to_string(), ColumnData::String(None)),
        ];
        let definition = CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::Int),
            VectorStoreField::data("name", PropertyType::String).with_storage_name("hotel_name"),
            VectorStoreField::vector("v", 2),
        ])
        .unwrap();
        let (record, score) = SqlServerRecordMapper
            .from_columns(columns, &definition, false)
            .unwrap();
        assert_eq!(record.key, Some(RecordKey::Int(7)));
        assert_eq!(record.data["name"], Value::Null);
        assert!(record.vectors.is_empty());
        assert_eq!(score, None);
    }
}
