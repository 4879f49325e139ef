use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, FilterExpr, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Vector,
    KeywordHybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchOptions {
    pub top: usize,
    pub skip: usize,
    pub filter: Option<FilterExpr>,
    pub vector_property: Option<String>,
    pub include_vectors: bool,
    pub include_total_count: bool,
}

impl Default for VectorSearchOptions {
    fn default() -> Self {
        Self {
            top: 3,
            skip: 0,
            filter: None,
            vector_property: None,
            include_vectors: false,
            include_total_count: false,
        }
    }
}

impl VectorSearchOptions {
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_vector_property(mut self, name: impl Into<String>) -> Self {
        self.vector_property = Some(name.into());
        self
    }

    pub fn with_vectors(mut self, include: bool) -> Self {
        self.include_vectors = include;
        self
    }

    pub fn with_total_count(mut self, include: bool) -> Self {
        self.include_total_count = include;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.top < 1 {
            return Err(DomainError::invalid_input("top must be at least 1"));
        }
        Ok(())
    }
}

/// A search request: the query vector plus keywords for hybrid search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchQuery {
    pub vector: Vec<f32>,
    pub keywords: Option<String>,
    pub options: VectorSearchOptions,
}

impl VectorSearchQuery {
    pub fn vector(vector: Vec<f32>, options: VectorSearchOptions) -> Self {
        Self {
            vector,
            keywords: None,
            options,
        }
    }

    pub fn hybrid(
        vector: Vec<f32>,
        keywords: impl Into<String>,
        options: VectorSearchOptions,
    ) -> Self {
        Self {
            vector,
            keywords: Some(keywords.into()),
            options,
        }
    }

    pub fn search_type(&self) -> SearchType {
        if self.keywords.is_some() {
            SearchType::KeywordHybrid
        } else {
            SearchType::Vector
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSearchResult {
    pub record: Record,
    pub score: Option<f64>,
}

impl VectorSearchResult {
    pub fn new(record: Record, score: Option<f64>) -> Self {
        Self { record, score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct VectorSearchResults {
    pub results: Vec<VectorSearchResult>,
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRecordOptions {
    pub include_vectors: bool,
}

impl GetRecordOptions {
    pub fn with_vectors() -> Self {
        Self {
            include_vectors: true,
        }
    }
}
