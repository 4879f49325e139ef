use serde_json::{json, Map, Value};

use crate::domain::{
    CollectionDefinition, DistanceFunction, DomainError, IndexKind, PropertyType, SearchType,
    VectorSearchQuery, VectorStoreField,
};

/// Name of the unnamed vector when a class stores a single vector.
pub const DEFAULT_VECTOR_NAME: &str = "default";

pub fn distance_name(function: DistanceFunction) -> Result<&'static str, DomainError> {
    match function {
        DistanceFunction::CosineDistance | DistanceFunction::Default => Ok("cosine"),
        DistanceFunction::DotProduct => Ok("dot"),
        DistanceFunction::EuclideanSquaredDistance => Ok("l2-squared"),
        DistanceFunction::Manhattan => Ok("manhattan"),
        DistanceFunction::Hamming => Ok("hamming"),
        other => Err(DomainError::invalid_model(format!(
            "Distance function {other} is not supported by Weaviate"
        ))),
    }
}

pub fn index_name(kind: IndexKind) -> Result<&'static str, DomainError> {
    match kind {
        IndexKind::Hnsw => Ok("hnsw"),
        IndexKind::Flat | IndexKind::Default => Ok("flat"),
        IndexKind::Dynamic => Ok("dynamic"),
        other => Err(DomainError::invalid_model(format!(
            "Index kind {other} is not supported by Weaviate"
        ))),
    }
}

pub fn data_type(property_type: &PropertyType) -> String {
    match property_type {
        PropertyType::String => "text".to_string(),
        PropertyType::Int => "int".to_string(),
        PropertyType::Float => "number".to_string(),
        PropertyType::Bool => "boolean".to_string(),
        PropertyType::DateTime => "date".to_string(),
        PropertyType::Json => "object".to_string(),
        PropertyType::List(inner) => match inner.as_ref() {
            PropertyType::List(_) | PropertyType::Json | PropertyType::Bytes => {
                "text[]".to_string()
            }
            scalar => format!("{}[]", data_type(scalar)),
        },
        PropertyType::Bytes => "text".to_string(),
    }
}

fn vector_index(field: &VectorStoreField) -> Result<(&'static str, Value), DomainError> {
    let index = index_name(field.index_kind())?;
    let distance = distance_name(field.distance_function())?;
    Ok((index, json!({ "distance": distance })))
}

/// Class payload for `POST /v1/schema`.
pub fn build_class_schema(
    class: &str,
    definition: &CollectionDefinition,
    named_vectors: bool,
) -> Result<Value, DomainError> {
    let properties: Vec<Value> = definition
        .data_fields()
        .map(|field| {
            json!({
                "name": field.storage_name(),
                "dataType": [data_type(field.property_type())],
                "indexFilterable": field.is_indexed(),
                "indexSearchable": field.is_full_text_indexed(),
            })
        })
        .collect();

    let mut schema = Map::new();
    schema.insert("class".into(), Value::String(class.to_string()));
    schema.insert("properties".into(), Value::Array(properties));

    if named_vectors {
        let mut vector_config = Map::new();
        for field in definition.vector_fields() {
            let (index, config) = vector_index(field)?;
            vector_config.insert(
                field.storage_name().to_string(),
                json!({
                    "vectorizer": { "none": {} },
                    "vectorIndexType": index,
                    "vectorIndexConfig": config,
                }),
            );
        }
        schema.insert("vectorConfig".into(), Value::Object(vector_config));
    } else {
        let field = single_vector_field(definition)?;
        let (index, config) = vector_index(field)?;
        schema.insert("vectorizer".into(), Value::String("none".into()));
        schema.insert("vectorIndexType".into(), Value::String(index.into()));
        schema.insert("vectorIndexConfig".into(), config);
    }

    Ok(Value::Object(schema))
}

pub fn single_vector_field(
    definition: &CollectionDefinition,
) -> Result<&VectorStoreField, DomainError> {
    let mut vectors = definition.vector_fields();
    match (vectors.next(), vectors.next()) {
        (Some(field), None) => Ok(field),
        _ => Err(DomainError::invalid_model(
            "Named vectors must be enabled unless the model has exactly one vector field",
        )),
    }
}

fn vector_literal(vector: &[f32]) -> String {
    let items: Vec<String> = vector.iter().map(|v| format!("{}", *v as f64)).collect();
    format!("[{}]", items.join(", "))
}

/// GraphQL `Get` query for a near-vector or hybrid search.
pub fn build_search_query(
    class: &str,
    definition: &CollectionDefinition,
    query: &VectorSearchQuery,
    vector_field: &VectorStoreField,
    named_vectors: bool,
    where_filter: Option<&str>,
) -> String {
    let options = &query.options;
    let mut arguments = vec![
        format!("limit: {}", options.top),
        format!("offset: {}", options.skip),
    ];
    if let Some(filter) = where_filter {
        arguments.push(format!("where: {filter}"));
    }

    let target = if named_vectors {
        format!(
            " targetVectors: [{}]",
            Value::String(vector_field.storage_name().to_string())
        )
    } else {
        String::new()
    };

    match (query.search_type(), query.keywords.as_deref()) {
        (SearchType::KeywordHybrid, Some(keywords)) => {
            let searchable: Vec<String> = definition
                .data_fields()
                .filter(|f| f.is_full_text_indexed())
                .map(|f| Value::String(f.storage_name().to_string()).to_string())
                .collect();
            let properties = if searchable.is_empty() {
                String::new()
            } else {
                format!(" properties: [{}]", searchable.join(", "))
            };
            arguments.push(format!(
                "hybrid: {{ query: {} vector: {}{target}{properties} }}",
                Value::String(keywords.to_string()),
                vector_literal(&query.vector)
            ));
        }
        _ => {
            arguments.push(format!(
                "nearVector: {{{target} vector: {} }}",
                vector_literal(&query.vector)
            ));
        }
    }

    let mut selection: Vec<String> = definition
        .data_fields()
        .map(|f| f.storage_name().to_string())
        .collect();

    let score = match query.search_type() {
        SearchType::KeywordHybrid => "score",
        SearchType::Vector => "distance",
    };
    let mut additional = vec!["id".to_string(), score.to_string()];
    if options.include_vectors {
        if named_vectors {
            let names: Vec<&str> = definition.vector_fields().map(|f| f.storage_name()).collect();
            additional.push(format!("vectors {{ {} }}", names.join(" ")));
        } else {
            additional.push("vector".to_string());
        }
    }
    selection.push(format!("_additional {{ {} }}", additional.join(" ")));

    format!(
        "{{ Get {{ {class}({}) {{ {} }} }} }}",
        arguments.join(" "),
        selection.join(" ")
    )
}
