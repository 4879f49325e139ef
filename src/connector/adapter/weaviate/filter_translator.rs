use serde_json::Value;

use crate::application::FilterTranslator;
use crate::domain::{
    resolve_filter_field, CollectionDefinition, CompareOp, DomainError, FilterExpr, PropertyType,
    VectorStoreField,
};

/// Renders filters as a GraphQL `where` argument, e.g.
/// `{ path: ["rating"], operator: GreaterThan, valueNumber: 4.5 }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeaviateFilterTranslator;

impl FilterTranslator for WeaviateFilterTranslator {
    type Output = String;

    fn translate(
        &self,
        filter: &FilterExpr,
        definition: &CollectionDefinition,
    ) -> Result<String, DomainError> {
        render(filter, definition)
    }
}

fn render(filter: &FilterExpr, definition: &CollectionDefinition) -> Result<String, DomainError> {
    match filter {
        FilterExpr::Compare { field, op, value } => {
            let field = resolve_filter_field(definition, field)?;
            let path = path_for(field);
            if value.is_null() {
                return match op {
                    CompareOp::Eq => Ok(format!(
                        "{{ path: {path}, operator: IsNull, valueBoolean: true }}"
                    )),
                    CompareOp::Ne => Ok(format!(
                        "{{ path: {path}, operator: IsNull, valueBoolean: false }}"
                    )),
                    _ => Err(DomainError::unsupported_filter(format!(
                        "operator {op} cannot compare against null"
                    ))),
                };
            }
            let operator = match op {
                CompareOp::Eq => "Equal",
                CompareOp::Ne => "NotEqual",
                CompareOp::Gt => "GreaterThan",
                CompareOp::Ge => "GreaterThanEqual",
                CompareOp::Lt => "LessThan",
                CompareOp::Le => "LessThanEqual",
            };
            let tag = value_tag(value, field)?;
            Ok(format!(
                "{{ path: {path}, operator: {operator}, {tag}: {} }}",
                literal(value)?
            ))
        }
        FilterExpr::In {
            field,
            values,
            negated,
        } => {
            if *negated {
                return Err(DomainError::unsupported_filter(
                    "NotIn is not supported by Weaviate filters",
                ));
            }
            let field = resolve_filter_field(definition, field)?;
            contains_any(field, values)
        }
        FilterExpr::Contains { field, value } => {
            let field = resolve_filter_field(definition, field)?;
            contains_any(field, std::slice::from_ref(value))
        }
        FilterExpr::And(operands) => combine("And", operands, definition),
        FilterExpr::Or(operands) => combine("Or", operands, definition),
        FilterExpr::Not(_) => Err(DomainError::unsupported_filter(
            "Unary operators are not supported in Weaviate filters",
        )),
    }
}

fn combine(
    operator: &str,
    operands: &[FilterExpr],
    definition: &CollectionDefinition,
) -> Result<String, DomainError> {
    if operands.is_empty() {
        return Err(DomainError::unsupported_filter(format!(
            "{operator} needs at least one operand"
        )));
    }
    if operands.len() == 1 {
        return render(&operands[0], definition);
    }
    let rendered = operands
        .iter()
        .map(|operand| render(operand, definition))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(
        "{{ operator: {operator}, operands: [{}] }}",
        rendered.join(", ")
    ))
}

fn contains_any(field: &VectorStoreField, values: &[Value]) -> Result<String, DomainError> {
    let tag = match values.first() {
        Some(first) => value_tag(first, field)?,
        None => tag_for_type(field.property_type()).ok_or_else(|| {
            DomainError::unsupported_filter(format!(
                "cannot infer the value type of an empty list for '{}'",
                field.name()
            ))
        })?,
    };
    let items = values.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
    Ok(format!(
        "{{ path: {}, operator: ContainsAny, {tag}: [{}] }}",
        path_for(field),
        items.join(", ")
    ))
}

fn path_for(field: &VectorStoreField) -> String {
    if field.is_key() {
        "[\"id\"]".to_string()
    } else {
        format!("[{}]", Value::String(field.storage_name().to_string()))
    }
}

fn value_tag(value: &Value, field: &VectorStoreField) -> Result<&'static str, DomainError> {
    match value {
        Value::String(_) if field.is_key() => Ok("valueText"),
        Value::String(_) => Ok(match field.property_type() {
            PropertyType::DateTime => "valueDate",
            _ => "valueText",
        }),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok("valueInt"),
        Value::Number(_) => Ok("valueNumber"),
        Value::Bool(_) => Ok("valueBoolean"),
        Value::Null => Err(DomainError::unsupported_filter(
            "null is only supported in equality comparisons",
        )),
        Value::Array(_) | Value::Object(_) => Err(DomainError::unsupported_filter(format!(
            "unsupported filter value {value}"
        ))),
    }
}

fn tag_for_type(property_type: &PropertyType) -> Option<&'static str> {
    match property_type {
        PropertyType::String => Some("valueText"),
        PropertyType::Int => Some("valueInt"),
        PropertyType::Float => Some("valueNumber"),
        PropertyType::Bool => Some("valueBoolean"),
        PropertyType::DateTime => Some("valueDate"),
        PropertyType::List(inner) => tag_for_type(inner),
        PropertyType::Json | PropertyType::Bytes => None,
    }
}

/// GraphQL literal for a scalar. JSON string escaping is valid GraphQL.
fn literal(value: &Value) -> Result<String, DomainError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
        other => Err(DomainError::unsupported_filter(format!(
            "unsupported filter value {other}"
        ))),
    }
}
