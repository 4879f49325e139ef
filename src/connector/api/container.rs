use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing::debug;

use crate::application::{
    ChatClient, EmbeddingService, GetRecordsUseCase, ManageCollectionsUseCase,
    SearchRecordsUseCase, UpsertRecordsUseCase, VectorStore,
};
use crate::connector::adapter::{
    AzureOpenAiClient, InMemoryVectorStore, MockEmbedding, MongoDbStore, OllamaClient,
    OpenAiClient, SqlServerStore, WeaviateStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Weaviate,
    Mongodb,
    SqlServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingProvider {
    Mock,
    Openai,
    AzureOpenai,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatProvider {
    Openai,
    AzureOpenai,
    Ollama,
}

pub struct ContainerConfig {
    pub store: StoreKind,
    pub embeddings: EmbeddingProvider,
    pub chat: Option<ChatProvider>,
    /// Size of the vectors produced by the mock embedding service.
    pub mock_dimensions: usize,
    /// Snapshot directory for the memory store. Without one it lives only as
    /// long as the process.
    pub data_dir: Option<PathBuf>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            embeddings: EmbeddingProvider::Mock,
            chat: None,
            mock_dimensions: 384,
            data_dir: None,
        }
    }
}

/// Wires one vector store, one embedding service and an optional chat client,
/// and hands out use cases built on them.
pub struct Container {
    store: Arc<dyn VectorStore>,
    embedding_service: Arc<dyn EmbeddingService>,
    chat_client: Option<Arc<dyn ChatClient>>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let store: Arc<dyn VectorStore> = match config.store {
            StoreKind::Memory => match &config.data_dir {
                Some(dir) => {
                    debug!("Using in-memory vector store persisted in {}", dir.display());
                    Arc::new(InMemoryVectorStore::open(dir)?)
                }
                None => {
                    debug!("Using in-memory vector store");
                    Arc::new(InMemoryVectorStore::new())
                }
            },
            StoreKind::Weaviate => Arc::new(WeaviateStore::from_env()?),
            StoreKind::Mongodb => Arc::new(MongoDbStore::from_env().await?),
            StoreKind::SqlServer => Arc::new(SqlServerStore::from_env().await?),
        };
        debug!("Vector store: {}", store.store_name());

        let embedding_service: Arc<dyn EmbeddingService> = match config.embeddings {
            EmbeddingProvider::Mock => {
                debug!("Using mock embedding service");
                Arc::new(MockEmbedding::with_dimensions(config.mock_dimensions))
            }
            EmbeddingProvider::Openai => Arc::new(OpenAiClient::from_env()?),
            EmbeddingProvider::AzureOpenai => Arc::new(AzureOpenAiClient::from_env()?),
            EmbeddingProvider::Ollama => Arc::new(OllamaClient::from_env()),
        };

        let chat_client: Option<Arc<dyn ChatClient>> = match config.chat {
            None => None,
            Some(ChatProvider::Openai) => Some(Arc::new(OpenAiClient::from_env()?)),
            Some(ChatProvider::AzureOpenai) => Some(Arc::new(AzureOpenAiClient::from_env()?)),
            Some(ChatProvider::Ollama) => Some(Arc::new(OllamaClient::from_env())),
        };

        Ok(Self::with_services(store, embedding_service, chat_client, config))
    }

    /// Builds a container around services that already exist.
    pub fn with_services(
        store: Arc<dyn VectorStore>,
        embedding_service: Arc<dyn EmbeddingService>,
        chat_client: Option<Arc<dyn ChatClient>>,
        config: ContainerConfig,
    ) -> Self {
        Self {
            store,
            embedding_service,
            chat_client,
            config,
        }
    }

    pub fn collections_use_case(&self) -> ManageCollectionsUseCase {
        ManageCollectionsUseCase::new(self.store.clone())
    }

    pub fn upsert_use_case(&self) -> UpsertRecordsUseCase {
        UpsertRecordsUseCase::new(self.store.clone(), self.embedding_service.clone())
    }

    pub fn search_use_case(&self) -> SearchRecordsUseCase {
        SearchRecordsUseCase::new(self.store.clone(), self.embedding_service.clone())
    }

    pub fn get_use_case(&self) -> GetRecordsUseCase {
        GetRecordsUseCase::new(self.store.clone())
    }

    pub fn chat_client(&self) -> Result<Arc<dyn ChatClient>> {
        self.chat_client
            .clone()
            .ok_or_else(|| anyhow!("no chat provider configured; pass --chat"))
    }

    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    pub fn store_kind(&self) -> StoreKind {
        self.config.store
    }
}
