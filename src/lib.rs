pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::{Commands, SearchArgs};

pub use application::{
    ChatClient, EmbeddingService, FilterTranslator, GetRecordsUseCase, ManageCollectionsUseCase,
    SearchRecordsUseCase, SearchRequest, UpsertRecordsUseCase, VectorStore, VectorStoreCollection,
};

pub use connector::{
    AzureOpenAiClient, Container, ContainerConfig, InMemoryVectorStore, MockEmbedding,
    MongoDbStore, OllamaClient, OpenAiClient, Router, SqlServerStore, WeaviateStore,
};

pub use domain::{
    CollectionDefinition, DomainError, FilterExpr, Record, RecordKey, VectorSearchOptions,
    VectorSearchQuery, VectorSearchResults, VectorStoreField,
};
