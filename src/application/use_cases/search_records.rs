use std::sync::Arc;

use tracing::info;

use crate::application::{EmbeddingService, VectorStore};
use crate::domain::{
    CollectionDefinition, DomainError, VectorSearchOptions, VectorSearchQuery,
    VectorSearchResults,
};

/// What to search for: free text that gets embedded, or a ready vector.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub text: String,
    pub vector: Option<Vec<f32>>,
    /// Also match `text` as keywords.
    pub hybrid: bool,
    pub options: VectorSearchOptions,
}

impl SearchRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vector: None,
            hybrid: false,
            options: VectorSearchOptions::default(),
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn hybrid(mut self) -> Self {
        self.hybrid = true;
        self
    }

    pub fn with_options(mut self, options: VectorSearchOptions) -> Self {
        self.options = options;
        self
    }
}

pub struct SearchRecordsUseCase {
    store: Arc<dyn VectorStore>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SearchRecordsUseCase {
    pub fn new(store: Arc<dyn VectorStore>, embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            store,
            embedding_service,
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        definition: CollectionDefinition,
        request: SearchRequest,
    ) -> Result<VectorSearchResults, DomainError> {
        request.options.validate()?;
        if request.vector.is_none() && request.text.trim().is_empty() {
            return Err(DomainError::invalid_input("search text cannot be empty"));
        }
        info!(
            "Searching {} in {} (hybrid={})",
            name,
            self.store.store_name(),
            request.hybrid
        );

        let vector = match request.vector {
            Some(vector) => vector,
            None => self.embedding_service.embed_query(&request.text).await?,
        };
        let query = if request.hybrid {
            VectorSearchQuery::hybrid(vector, request.text, request.options)
        } else {
            VectorSearchQuery::vector(vector, request.options)
        };

        let collection = self.store.collection(name, definition)?;
        collection.search(&query).await
    }
}
