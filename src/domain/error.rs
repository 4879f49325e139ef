use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A store or driver call failed. Carries enough context to tell which
    /// backend, collection and operation were involved.
    #[error("{store} operation '{operation}' failed on collection '{collection}': {source}")]
    OperationFailed {
        store: &'static str,
        collection: String,
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Field '{0}' not in data model")]
    UnknownField(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn operation(
        store: &'static str,
        collection: impl Into<String>,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::OperationFailed {
            store,
            collection: collection.into(),
            operation,
            source: source.into(),
        }
    }

    pub fn invalid_model(msg: impl Into<String>) -> Self {
        Self::InvalidModel(msg.into())
    }

    pub fn unsupported_filter(msg: impl Into<String>) -> Self {
        Self::UnsupportedFilter(msg.into())
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_operation_failure(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }

    pub fn is_unsupported_filter(&self) -> bool {
        matches!(self, Self::UnsupportedFilter(_))
    }
}

/// Attaches store/collection/operation context to driver and transport errors.
pub trait OperationContext<T> {
    fn in_operation(
        self,
        store: &'static str,
        collection: &str,
        operation: &'static str,
    ) -> Result<T, DomainError>;
}

impl<T, E> OperationContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn in_operation(
        self,
        store: &'static str,
        collection: &str,
        operation: &'static str,
    ) -> Result<T, DomainError> {
        self.map_err(|e| DomainError::operation(store, collection, operation, e))
    }
}
