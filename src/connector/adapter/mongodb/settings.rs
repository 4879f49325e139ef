use crate::domain::DomainError;

pub const DEFAULT_DATABASE_NAME: &str = "default";
pub const DEFAULT_INDEX_NAME: &str = "vector_index";

/// Connection settings for MongoDB Atlas.
///
/// | Variable                           | Default        |
/// |------------------------------------|----------------|
/// | `MONGODB_ATLAS_CONNECTION_STRING`  | required       |
/// | `MONGODB_ATLAS_DATABASE_NAME`      | `default`      |
/// | `MONGODB_ATLAS_INDEX_NAME`         | `vector_index` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoDbSettings {
    pub connection_string: String,
    pub database_name: String,
    pub index_name: String,
}

impl MongoDbSettings {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
        }
    }

    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let connection_string = lookup("MONGODB_ATLAS_CONNECTION_STRING")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                DomainError::configuration("MONGODB_ATLAS_CONNECTION_STRING is not set")
            })?;
        let mut settings = Self::new(connection_string);
        if let Some(database) = lookup("MONGODB_ATLAS_DATABASE_NAME").filter(|v| !v.is_empty()) {
            settings.database_name = database;
        }
        if let Some(index) = lookup("MONGODB_ATLAS_INDEX_NAME").filter(|v| !v.is_empty()) {
            settings.index_name = index;
        }
        Ok(settings)
    }
}
