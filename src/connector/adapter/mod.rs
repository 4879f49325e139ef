//! Store and provider adapters.

pub mod ai;
pub mod in_memory;
pub mod mongodb;
pub mod sql_server;
pub mod weaviate;

pub use ai::{
    AzureOpenAiClient, AzureOpenAiSettings, MockEmbedding, OllamaClient, OllamaSettings,
    OpenAiClient, OpenAiSettings,
};
pub use in_memory::{InMemoryFilterTranslator, InMemoryVectorStore, RecordPredicate};
pub use self::mongodb::{MongoDbFilterTranslator, MongoDbSettings, MongoDbStore};
pub use sql_server::{SqlServerFilterTranslator, SqlServerSettings, SqlServerStore};
pub use weaviate::{WeaviateFilterTranslator, WeaviateSettings, WeaviateStore};
