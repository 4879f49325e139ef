use std::sync::Arc;

use async_trait::async_trait;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

use crate::application::{VectorStore, VectorStoreCollection};
use crate::domain::{CollectionDefinition, DomainError, OperationContext};

use super::collection::{SqlServerClient, SQL_SERVER_STORE_NAME};
use super::query_builder::build_list_tables;
use super::{SqlServerCollection, SqlServerSettings};

/// A SQL Server database. One connection is shared by every collection.
pub struct SqlServerStore {
    client: Arc<Mutex<SqlServerClient>>,
    schema: Option<String>,
}

impl SqlServerStore {
    pub async fn connect(settings: &SqlServerSettings) -> Result<Self, DomainError> {
        let config = Config::from_ado_string(&settings.connection_string)
            .in_operation(SQL_SERVER_STORE_NAME, "", "connect")?;
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .in_operation(SQL_SERVER_STORE_NAME, "", "connect")?;
        tcp.set_nodelay(true)
            .in_operation(SQL_SERVER_STORE_NAME, "", "connect")?;
        let client = Client::connect(config, tcp.compat_write())
            .await
            .in_operation(SQL_SERVER_STORE_NAME, "", "connect")?;
        debug!("Connected to SQL Server");

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
            schema: settings.schema.clone(),
        })
    }

    pub async fn from_env() -> Result<Self, DomainError> {
        Self::connect(&SqlServerSettings::from_env()?).await
    }
}

#[async_trait]
impl VectorStore for SqlServerStore {
    fn store_name(&self) -> &'static str {
        SQL_SERVER_STORE_NAME
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, DomainError> {
        let command = build_list_tables(self.schema.as_deref())?;
        let params = command.to_sql_params();
        let mut client = self.client.lock().await;
        let rows = client
            .query(command.text(), &params)
            .await
            .in_operation(SQL_SERVER_STORE_NAME, "", "list_collection_names")?
            .into_first_result()
            .await
            .in_operation(SQL_SERVER_STORE_NAME, "", "list_collection_names")?;

        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = row
                .try_get::<&str, _>(0)
                .in_operation(SQL_SERVER_STORE_NAME, "", "list_collection_names")?;
            if let Some(name) = name {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Arc<dyn VectorStoreCollection>, DomainError> {
        let collection = SqlServerCollection::new(self.client.clone(), name, definition)?;
        Ok(Arc::new(collection))
    }
}
