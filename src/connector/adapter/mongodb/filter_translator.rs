use mongodb::bson::{doc, Bson, Document};

use crate::application::FilterTranslator;
use crate::domain::{
    resolve_filter_field, CollectionDefinition, CompareOp, DomainError, FilterExpr,
    VectorStoreField,
};

use super::record_mapper::{json_to_bson, KEY_FIELD};

/// Renders filters as BSON query documents, e.g. `{ "rating": { "$gte": 4 } }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDbFilterTranslator;

impl FilterTranslator for MongoDbFilterTranslator {
    type Output = Document;

    fn translate(
        &self,
        filter: &FilterExpr,
        definition: &CollectionDefinition,
    ) -> Result<Document, DomainError> {
        render(filter, definition)
    }
}

fn path(field: &VectorStoreField) -> String {
    if field.is_key() {
        KEY_FIELD.to_string()
    } else {
        field.storage_name().to_string()
    }
}

fn render(filter: &FilterExpr, definition: &CollectionDefinition) -> Result<Document, DomainError> {
    match filter {
        FilterExpr::Compare { field, op, value } => {
            let field = resolve_filter_field(definition, field)?;
            let operator = match op {
                CompareOp::Eq => "$eq",
                CompareOp::Ne => "$ne",
                CompareOp::Gt => "$gt",
                CompareOp::Ge => "$gte",
                CompareOp::Lt => "$lt",
                CompareOp::Le => "$lte",
            };
            let mut condition = Document::new();
            condition.insert(operator, json_to_bson(value));
            let mut document = Document::new();
            document.insert(path(field), condition);
            Ok(document)
        }
        FilterExpr::In {
            field,
            values,
            negated,
        } => {
            let field = resolve_filter_field(definition, field)?;
            let operator = if *negated { "$nin" } else { "$in" };
            let values: Vec<Bson> = values.iter().map(json_to_bson).collect();
            let mut condition = Document::new();
            condition.insert(operator, values);
            let mut document = Document::new();
            document.insert(path(field), condition);
            Ok(document)
        }
        FilterExpr::Contains { field, value } => {
            let field = resolve_filter_field(definition, field)?;
            let mut document = Document::new();
            document.insert(path(field), doc! { "$in": [json_to_bson(value)] });
            Ok(document)
        }
        FilterExpr::And(operands) => combine("$and", operands, definition),
        FilterExpr::Or(operands) => combine("$or", operands, definition),
        FilterExpr::Not(inner) => {
            let inner = render(inner, definition)?;
            Ok(doc! { "$nor": [inner] })
        }
    }
}

fn combine(
    operator: &str,
    operands: &[FilterExpr],
    definition: &CollectionDefinition,
) -> Result<Document, DomainError> {
    if operands.is_empty() {
        return Err(DomainError::unsupported_filter(format!(
            "{operator} needs at least one operand"
        )));
    }
    let rendered = operands
        .iter()
        .map(|operand| render(operand, definition).map(Bson::Document))
        .collect::<Result<Vec<_>, _>>()?;
    let mut document = Document::new();
    document.insert(operator, rendered);
    Ok(document)
}
