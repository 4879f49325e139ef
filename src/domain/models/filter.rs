use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CollectionDefinition, DomainError, VectorStoreField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        };
        f.write_str(symbol)
    }
}

/// Store-neutral boolean filter over the data fields of a collection.
///
/// Each connector turns this tree into its native syntax through a
/// [`FilterTranslator`](crate::application::FilterTranslator). Field names may
/// be given either as the model name or as the storage name.
///
/// In JSON the tree is externally tagged:
///
/// ```json
/// {"and": [
///     {"compare": {"field": "rating", "op": "ge", "value": 4}},
///     {"contains": {"field": "tags", "value": "pool"}}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
        #[serde(default)]
        negated: bool,
    },
    /// A list field holds the value.
    Contains { field: String, value: Value },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        FilterExpr::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        FilterExpr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        FilterExpr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn and(operands: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::And(operands.into_iter().collect())
    }

    pub fn or(operands: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::Or(operands.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: FilterExpr) -> Self {
        FilterExpr::Not(Box::new(inner))
    }

    /// Parse a filter from its JSON form.
    pub fn from_json_str(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::invalid_input(format!("invalid filter: {e}")))
    }
}

/// Look up a field referenced by a filter. Vector fields cannot be filtered on.
pub fn resolve_filter_field<'a>(
    definition: &'a CollectionDefinition,
    name: &str,
) -> Result<&'a VectorStoreField, DomainError> {
    let field = definition
        .field(name)
        .ok_or_else(|| DomainError::UnknownField(name.to_string()))?;
    if field.is_vector() {
        return Err(DomainError::unsupported_filter(format!(
            "vector field '{}' cannot be used in a filter",
            field.name()
        )));
    }
    Ok(field)
}
