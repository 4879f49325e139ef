use crate::domain::DomainError;

/// Connection settings for SQL Server, read from
/// `SQL_SERVER_CONNECTION_STRING` (ADO.NET format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlServerSettings {
    pub connection_string: String,
    /// Restricts `list_collection_names` to one schema.
    pub schema: Option<String>,
}

impl SqlServerSettings {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let connection_string = lookup("SQL_SERVER_CONNECTION_STRING")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DomainError::configuration("SQL_SERVER_CONNECTION_STRING is not set"))?;
        let mut settings = Self::new(connection_string);
        settings.schema = lookup("SQL_SERVER_SCHEMA").filter(|v| !v.is_empty());
        Ok(settings)
    }
}
