use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Generates vector embeddings for record text and search queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::service("embedding service returned no vectors"))
    }

    fn config(&self) -> &EmbeddingConfig;
}
