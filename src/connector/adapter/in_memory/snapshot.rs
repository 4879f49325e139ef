//! JSON snapshot of the in-memory tables, so `kconnect` runs share data
//! through a data directory.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{DomainError, Record};

use super::collection::Table;

pub const SNAPSHOT_FILE_NAME: &str = "memory_store.json";

/// On disk: collection name to its records, each carrying its key.
type Snapshot = BTreeMap<String, Vec<Record>>;

pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE_NAME)
}

/// A missing file is an empty store.
pub fn load(path: &Path) -> Result<HashMap<String, Table>, DomainError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
        DomainError::storage(format!("invalid memory snapshot {}: {e}", path.display()))
    })?;

    let mut tables = HashMap::with_capacity(snapshot.len());
    for (name, records) in snapshot {
        let mut table = Table::with_capacity(records.len());
        for record in records {
            let key = record.key().cloned().ok_or_else(|| {
                DomainError::storage(format!("record without a key in collection '{name}'"))
            })?;
            table.insert(key, record);
        }
        tables.insert(name, table);
    }
    debug!("Loaded {} collections from {}", tables.len(), path.display());
    Ok(tables)
}

pub async fn save(path: &Path, tables: &HashMap<String, Table>) -> Result<(), DomainError> {
    let snapshot: Snapshot = tables
        .iter()
        .map(|(name, table)| (name.clone(), table.values().cloned().collect()))
        .collect();
    let raw = serde_json::to_string(&snapshot)
        .map_err(|e| DomainError::storage(format!("failed to encode memory snapshot: {e}")))?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}
