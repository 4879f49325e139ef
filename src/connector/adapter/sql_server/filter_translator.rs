use crate::application::FilterTranslator;
use crate::domain::{
    resolve_filter_field, CollectionDefinition, CompareOp, DomainError, FilterExpr,
};

use super::command::{quote_identifier, SqlCommand, SqlParam};

/// Renders filters as a parameterised `WHERE` clause body. Constants are
/// always sent as parameters, numbered from `@P1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerFilterTranslator;

impl FilterTranslator for SqlServerFilterTranslator {
    type Output = SqlCommand;

    fn translate(
        &self,
        filter: &FilterExpr,
        definition: &CollectionDefinition,
    ) -> Result<SqlCommand, DomainError> {
        let mut command = SqlCommand::default();
        let clause = render(filter, definition, &mut command)?;
        command.query.append(&clause);
        Ok(command)
    }
}

fn column(definition: &CollectionDefinition, name: &str) -> Result<String, DomainError> {
    let field = resolve_filter_field(definition, name)?;
    Ok(quote_identifier(field.storage_name()))
}

fn render(
    filter: &FilterExpr,
    definition: &CollectionDefinition,
    command: &mut SqlCommand,
) -> Result<String, DomainError> {
    match filter {
        FilterExpr::Compare { field, op, value } => {
            let column = column(definition, field)?;
            if value.is_null() {
                return match op {
                    CompareOp::Eq => Ok(format!("{column} IS NULL")),
                    CompareOp::Ne => Ok(format!("{column} IS NOT NULL")),
                    _ => Err(DomainError::unsupported_filter(format!(
                        "operator {op} cannot compare against NULL"
                    ))),
                };
            }
            let operator = match op {
                CompareOp::Eq => "=",
                CompareOp::Ne => "<>",
                CompareOp::Gt => ">",
                CompareOp::Ge => ">=",
                CompareOp::Lt => "<",
                CompareOp::Le => "<=",
            };
            let placeholder = command.add_parameter(SqlParam::from_json(value))?;
            Ok(format!("{column} {operator} {placeholder}"))
        }
        FilterExpr::In {
            field,
            values,
            negated,
        } => {
            let column = column(definition, field)?;
            if values.is_empty() {
                // Nothing is a member of the empty set.
                return Ok(if *negated { "1 = 1" } else { "1 = 0" }.to_string());
            }
            let placeholders = command.add_parameters(values.iter().map(SqlParam::from_json))?;
            let operator = if *negated { "NOT IN" } else { "IN" };
            Ok(format!("{column} {operator} ({})", placeholders.join(", ")))
        }
        FilterExpr::Contains { field, value } => {
            let column = column(definition, field)?;
            let placeholder = command.add_parameter(SqlParam::from_json(value))?;
            Ok(format!(
                "{placeholder} IN (SELECT value FROM OPENJSON({column}))"
            ))
        }
        FilterExpr::And(operands) => combine("AND", operands, definition, command),
        FilterExpr::Or(operands) => combine("OR", operands, definition, command),
        FilterExpr::Not(inner) => {
            let inner = render(inner, definition, command)?;
            Ok(format!("NOT ({inner})"))
        }
    }
}

fn combine(
    operator: &str,
    operands: &[FilterExpr],
    definition: &CollectionDefinition,
    command: &mut SqlCommand,
) -> Result<String, DomainError> {
    if operands.is_empty() {
        return Err(DomainError::unsupported_filter(format!(
            "{operator} needs at least one operand"
        )));
    }
    let parts = operands
        .iter()
        .map(|operand| render(operand, definition, command))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(&format!(" {operator} "))))
}
