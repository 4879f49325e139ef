use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::application::{VectorStore, VectorStoreCollection};
use crate::domain::{CollectionDefinition, DomainError};

use super::collection::{Tables, IN_MEMORY_STORE_NAME};
use super::{snapshot, InMemoryCollection};

/// Process-local store for tests and offline runs. Clones share their data.
///
/// A store opened on a data directory writes a JSON snapshot after every
/// change, so separate `kconnect` invocations see the same collections.
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    tables: Tables,
    snapshot: Option<PathBuf>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(data_dir: &Path) -> Result<Self, DomainError> {
        let path = snapshot::snapshot_path(data_dir);
        let tables = snapshot::load(&path)?;
        info!(
            "Opened memory store at {} ({} collections)",
            path.display(),
            tables.len()
        );
        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
            snapshot: Some(path),
        })
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn store_name(&self) -> &'static str {
        IN_MEMORY_STORE_NAME
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, DomainError> {
        let tables = self.tables.lock().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn collection(
        &self,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Arc<dyn VectorStoreCollection>, DomainError> {
        if name.is_empty() {
            return Err(DomainError::invalid_input("collection name cannot be empty"));
        }
        Ok(Arc::new(InMemoryCollection::new(
            self.tables.clone(),
            self.snapshot.clone(),
            name,
            definition,
        )))
    }
}
