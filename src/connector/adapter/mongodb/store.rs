use std::sync::Arc;

use async_trait::async_trait;
use mongodb::{Client, Database};
use tracing::debug;

use crate::application::{VectorStore, VectorStoreCollection};
use crate::domain::{CollectionDefinition, DomainError, OperationContext};

use super::collection::MONGODB_STORE_NAME;
use super::{MongoDbCollection, MongoDbSettings};

/// MongoDB Atlas database holding vector collections.
pub struct MongoDbStore {
    #[allow(dead_code)]
    client: Client,
    database: Database,
    index_name: String,
}

impl MongoDbStore {
    pub async fn connect(settings: &MongoDbSettings) -> Result<Self, DomainError> {
        let client = Client::with_uri_str(&settings.connection_string)
            .await
            .in_operation(MONGODB_STORE_NAME, &settings.database_name, "connect")?;
        debug!("Connected to MongoDB database {}", settings.database_name);
        Ok(Self {
            database: client.database(&settings.database_name),
            client,
            index_name: settings.index_name.clone(),
        })
    }

    pub async fn from_env() -> Result<Self, DomainError> {
        Self::connect(&MongoDbSettings::from_env()?).await
    }
}

#[async_trait]
impl VectorStore for MongoDbStore {
    fn store_name(&self) -> &'static str {
        MONGODB_STORE_NAME
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, DomainError> {
        self.database
            .list_collection_names()
            .await
            .in_operation(MONGODB_STORE_NAME, self.database.name(), "list_collection_names")
    }

    fn collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Arc<dyn VectorStoreCollection>, DomainError> {
        let collection =
            MongoDbCollection::new(self.database.clone(), name, &self.index_name, definition)?;
        Ok(Arc::new(collection))
    }
}
