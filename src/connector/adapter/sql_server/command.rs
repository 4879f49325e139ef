use std::borrow::Cow;
use std::fmt;

use serde_json::Value;
use tiberius::{ColumnData, ToSql};

use crate::domain::DomainError;

/// Hard limit of parameters in one SQL Server request.
pub const SQL_PARAMETER_MAX_COUNT: usize = 2100;
/// Budget used when splitting upserts into batches.
pub const SQL_PARAMETER_SAFETY_MAX_COUNT: usize = 2000;

/// A typed query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl SqlParam {
    /// Arrays and objects are sent as JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlParam::String(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlParam::String(value.to_string()),
        }
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            SqlParam::Null => ColumnData::String(None),
            SqlParam::String(s) => ColumnData::String(Some(Cow::Borrowed(s.as_str()))),
            SqlParam::Int(i) => ColumnData::I64(Some(*i)),
            SqlParam::Float(f) => ColumnData::F64(Some(*f)),
            SqlParam::Bool(b) => ColumnData::Bit(Some(*b)),
            SqlParam::Bytes(bytes) => ColumnData::Binary(Some(Cow::Borrowed(bytes.as_slice()))),
        }
    }
}

/// String builder for T-SQL statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    buffer: String,
}

impl QueryBuilder {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            buffer: initial.into(),
        }
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    pub fn append_list<S: AsRef<str>>(&mut self, items: &[S], separator: &str) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.buffer.push_str(separator);
            }
            self.buffer.push_str(item.as_ref());
        }
        self
    }

    /// Appends `{prefix} [schema].[table] {suffix}`.
    pub fn append_table_name(
        &mut self,
        schema: &str,
        table: &str,
        prefix: &str,
        suffix: &str,
        newline: bool,
    ) -> &mut Self {
        self.buffer.push_str(&format!(
            "{prefix} {}.{} {suffix}",
            quote_identifier(schema),
            quote_identifier(table)
        ));
        if newline {
            self.buffer.push('\n');
        }
        self
    }

    /// Drops the last `count` characters; a shorter buffer is left untouched.
    pub fn remove_last(&mut self, count: usize) -> &mut Self {
        let len = self.buffer.chars().count();
        if len >= count {
            let keep: String = self.buffer.chars().take(len - count).collect();
            self.buffer = keep;
        }
        self
    }

    pub fn in_parenthesis(
        &mut self,
        prefix: &str,
        suffix: &str,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.buffer.push_str(prefix);
        if !prefix.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push('(');
        body(self);
        self.buffer.push(')');
        self.buffer.push_str(suffix);
        self
    }

    pub fn in_logical_group(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.buffer.push_str("BEGIN\n");
        body(self);
        self.buffer.push_str("\nEND\n");
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}

/// `[name]`, with closing brackets escaped.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Query text plus its positional parameters (`@P1`, `@P2`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlCommand {
    pub query: QueryBuilder,
    parameters: Vec<SqlParam>,
}

impl SqlCommand {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            query: QueryBuilder::new(initial),
            parameters: Vec::new(),
        }
    }

    /// Registers a parameter and returns its placeholder.
    pub fn add_parameter(&mut self, value: SqlParam) -> Result<String, DomainError> {
        if self.parameters.len() + 1 > SQL_PARAMETER_MAX_COUNT {
            return Err(DomainError::invalid_input(format!(
                "The maximum number of parameters is {SQL_PARAMETER_MAX_COUNT}"
            )));
        }
        self.parameters.push(value);
        Ok(format!("@P{}", self.parameters.len()))
    }

    pub fn add_parameters(
        &mut self,
        values: impl IntoIterator<Item = SqlParam>,
    ) -> Result<Vec<String>, DomainError> {
        values
            .into_iter()
            .map(|value| self.add_parameter(value))
            .collect()
    }

    pub fn parameters(&self) -> &[SqlParam] {
        &self.parameters
    }

    pub fn text(&self) -> &str {
        self.query.as_str()
    }

    pub fn into_parts(self) -> (String, Vec<SqlParam>) {
        (self.query.buffer, self.parameters)
    }

    /// Parameters in the shape `tiberius` expects.
    pub fn to_sql_params(&self) -> Vec<&dyn ToSql> {
        self.parameters.iter().map(|p| p as &dyn ToSql).collect()
    }
}

impl fmt::Display for SqlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query.as_str())
    }
}
