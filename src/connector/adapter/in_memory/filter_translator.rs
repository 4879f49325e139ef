use std::cmp::Ordering;

use serde_json::Value;

use crate::application::FilterTranslator;
use crate::domain::{
    resolve_filter_field, CollectionDefinition, CompareOp, DomainError, FilterExpr, Record,
};

/// Where a predicate reads its operand from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    Key,
    Data(String),
}

impl FieldRef {
    fn read(&self, record: &Record) -> Value {
        match self {
            FieldRef::Key => record.key().map(|k| k.to_value()).unwrap_or(Value::Null),
            FieldRef::Data(name) => record.data.get(name).cloned().unwrap_or(Value::Null),
        }
    }
}

/// A filter compiled against a definition and evaluated record by record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPredicate {
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Value,
    },
    In {
        field: FieldRef,
        values: Vec<Value>,
        negated: bool,
    },
    Contains {
        field: FieldRef,
        value: Value,
    },
    And(Vec<RecordPredicate>),
    Or(Vec<RecordPredicate>),
    Not(Box<RecordPredicate>),
}

impl RecordPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordPredicate::Compare { field, op, value } => {
                let actual = field.read(record);
                match op {
                    CompareOp::Eq => values_equal(&actual, value),
                    CompareOp::Ne => !values_equal(&actual, value),
                    CompareOp::Gt => compare(&actual, value) == Some(Ordering::Greater),
                    CompareOp::Ge => matches!(
                        compare(&actual, value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    CompareOp::Lt => compare(&actual, value) == Some(Ordering::Less),
                    CompareOp::Le => matches!(
                        compare(&actual, value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                }
            }
            RecordPredicate::In {
                field,
                values,
                negated,
            } => {
                let actual = field.read(record);
                values.iter().any(|v| values_equal(&actual, v)) != *negated
            }
            RecordPredicate::Contains { field, value } => match field.read(record) {
                Value::Array(items) => items.iter().any(|item| values_equal(item, value)),
                _ => false,
            },
            RecordPredicate::And(operands) => operands.iter().all(|p| p.matches(record)),
            RecordPredicate::Or(operands) => operands.iter().any(|p| p.matches(record)),
            RecordPredicate::Not(inner) => !inner.matches(record),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Numbers compare numerically and strings lexically; other pairs are unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryFilterTranslator;

impl FilterTranslator for InMemoryFilterTranslator {
    type Output = RecordPredicate;

    fn translate(
        &self,
        filter: &FilterExpr,
        definition: &CollectionDefinition,
    ) -> Result<RecordPredicate, DomainError> {
        let field_ref = |name: &str| -> Result<FieldRef, DomainError> {
            let field = resolve_filter_field(definition, name)?;
            Ok(if field.is_key() {
                FieldRef::Key
            } else {
                FieldRef::Data(field.name().to_string())
            })
        };

        let predicate = match filter {
            FilterExpr::Compare { field, op, value } => RecordPredicate::Compare {
                field: field_ref(field)?,
                op: *op,
                value: value.clone(),
            },
            FilterExpr::In {
                field,
                values,
                negated,
            } => RecordPredicate::In {
                field: field_ref(field)?,
                values: values.clone(),
                negated: *negated,
            },
            FilterExpr::Contains { field, value } => RecordPredicate::Contains {
                field: field_ref(field)?,
                value: value.clone(),
            },
            FilterExpr::And(operands) => RecordPredicate::And(
                operands
                    .iter()
                    .map(|f| self.translate(f, definition))
                    .collect::<Result<_, _>>()?,
            ),
            FilterExpr::Or(operands) => RecordPredicate::Or(
                operands
                    .iter()
                    .map(|f| self.translate(f, definition))
                    .collect::<Result<_, _>>()?,
            ),
            FilterExpr::Not(inner) => {
                RecordPredicate::Not(Box::new(self.translate(inner, definition)?))
            }
        };
        Ok(predicate)
    }
}
