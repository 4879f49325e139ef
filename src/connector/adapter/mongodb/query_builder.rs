use mongodb::bson::{doc, Bson, Document};

use crate::domain::{
    CollectionDefinition, DistanceFunction, DomainError, IndexKind, VectorSearchQuery,
    VectorStoreField,
};

use super::record_mapper::{KEY_FIELD, SCORE_FIELD};

pub fn similarity_name(function: DistanceFunction) -> Result<&'static str, DomainError> {
    match function {
        DistanceFunction::CosineSimilarity | DistanceFunction::Default => Ok("cosine"),
        DistanceFunction::DotProduct => Ok("dotProduct"),
        DistanceFunction::EuclideanDistance => Ok("euclidean"),
        other => Err(DomainError::invalid_model(format!(
            "Distance function {other} is not supported by MongoDB Atlas"
        ))),
    }
}

fn check_index_kind(field: &VectorStoreField) -> Result<(), DomainError> {
    match field.index_kind() {
        IndexKind::Hnsw | IndexKind::Default => Ok(()),
        other => Err(DomainError::invalid_model(format!(
            "Index kind {other} is not supported by MongoDB Atlas"
        ))),
    }
}

/// The Atlas `vectorSearch` index covering every vector field and every
/// indexed data field.
pub fn build_search_index(
    index_name: &str,
    definition: &CollectionDefinition,
) -> Result<Document, DomainError> {
    let mut fields: Vec<Bson> = Vec::new();
    for field in definition.vector_fields() {
        check_index_kind(field)?;
        let dimensions = field.dimensions().unwrap_or_default() as i64;
        fields.push(Bson::Document(doc! {
            "type": "vector",
            "path": field.storage_name(),
            "numDimensions": dimensions,
            "similarity": similarity_name(field.distance_function())?,
        }));
    }
    for field in definition.data_fields().filter(|f| f.is_indexed()) {
        fields.push(Bson::Document(doc! {
            "type": "filter",
            "path": field.storage_name(),
        }));
    }

    Ok(doc! {
        "name": index_name,
        "type": "vectorSearch",
        "definition": { "fields": fields },
    })
}

/// `createSearchIndexes` command for a collection.
pub fn build_create_index_command(
    collection: &str,
    index_name: &str,
    definition: &CollectionDefinition,
) -> Result<Document, DomainError> {
    let index = build_search_index(index_name, definition)?;
    Ok(doc! {
        "createSearchIndexes": collection,
        "indexes": [index],
    })
}

/// Projection returning the key and data fields, plus vectors when requested.
pub fn build_projection(definition: &CollectionDefinition, include_vectors: bool) -> Document {
    let mut projection = Document::new();
    projection.insert(KEY_FIELD, 1);
    for field in definition.data_fields() {
        projection.insert(field.storage_name(), 1);
    }
    if include_vectors {
        for field in definition.vector_fields() {
            projection.insert(field.storage_name(), 1);
        }
    }
    projection
}

pub fn build_search_pipeline(
    index_name: &str,
    definition: &CollectionDefinition,
    query: &VectorSearchQuery,
    vector_field: &VectorStoreField,
    filter: Option<Document>,
) -> Vec<Document> {
    let options = &query.options;
    let limit = (options.top + options.skip) as i64;
    let vector: Vec<Bson> = query.vector.iter().map(|v| Bson::Double(*v as f64)).collect();

    let mut vector_search = doc! {
        "index": index_name,
        "path": vector_field.storage_name(),
        "queryVector": vector,
        "limit": limit,
        "numCandidates": limit * 10,
    };
    if let Some(filter) = filter {
        vector_search.insert("filter", filter);
    }

    let mut projection = build_projection(definition, options.include_vectors);
    projection.insert(SCORE_FIELD, doc! { "$meta": "vectorSearchScore" });

    vec![
        doc! { "$vectorSearch": vector_search },
        doc! { "$skip": options.skip as i64 },
        doc! { "$project": projection },
    ]
}
