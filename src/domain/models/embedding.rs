use serde::{Deserialize, Serialize};

/// Configuration for the embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    model_name: String,
    dimensions: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimensions,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Zero when the provider decides the size.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::new("mock-embedding", 384)
    }
}
