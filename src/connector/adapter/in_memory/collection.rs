use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::application::{FilterTranslator, VectorStoreCollection};
use crate::domain::{
    CollectionDefinition, DomainError, GetRecordOptions, PropertyType, Record, RecordKey,
    VectorSearchQuery, VectorSearchResult, VectorSearchResults,
};

use super::distance::{resolve, score};
use super::snapshot;
use super::InMemoryFilterTranslator;

pub(crate) const IN_MEMORY_STORE_NAME: &str = "InMemory";

pub(crate) type Table = HashMap<RecordKey, Record>;
pub(crate) type Tables = Arc<Mutex<HashMap<String, Table>>>;

/// A collection held in a process-local map.
pub struct InMemoryCollection {
    tables: Tables,
    snapshot: Option<PathBuf>,
    name: String,
    definition: CollectionDefinition,
}

impl InMemoryCollection {
    pub(crate) fn new(
        tables: Tables,
        snapshot: Option<PathBuf>,
        name: &str,
        definition: CollectionDefinition,
    ) -> Self {
        Self {
            tables,
            snapshot,
            name: name.to_string(),
            definition,
        }
    }

    async fn persist(&self, tables: &HashMap<String, Table>) -> Result<(), DomainError> {
        match &self.snapshot {
            Some(path) => snapshot::save(path, tables).await,
            None => Ok(()),
        }
    }

    fn check_dimensions(&self, record: &Record) -> Result<(), DomainError> {
        for (name, vector) in &record.vectors {
            let Some(expected) = self.definition.field(name).and_then(|f| f.dimensions()) else {
                continue;
            };
            if expected != vector.len() {
                return Err(DomainError::mapping(format!(
                    "vector field '{name}' expects {expected} dimensions, got {}",
                    vector.len()
                )));
            }
        }
        Ok(())
    }

    fn missing(&self) -> DomainError {
        DomainError::not_found(format!("collection '{}' does not exist", self.name))
    }

    /// Integer keys continue after the largest key in use.
    fn next_key<'a>(
        &self,
        taken: impl Iterator<Item = &'a RecordKey>,
    ) -> Result<RecordKey, DomainError> {
        match self.definition.key_field().property_type() {
            PropertyType::Int => {
                let max = taken
                    .filter_map(|k| match k {
                        RecordKey::Int(i) => Some(*i),
                        RecordKey::String(_) => None,
                    })
                    .max()
                    .unwrap_or(0);
                max.checked_add(1).map(RecordKey::Int).ok_or_else(|| {
                    DomainError::invalid_input(format!(
                        "no integer key left to generate in collection '{}'",
                        self.name
                    ))
                })
            }
            _ => Ok(RecordKey::String(Uuid::new_v4().to_string())),
        }
    }

    /// Hybrid search keeps records whose text fields mention any keyword.
    fn mentions_keywords(&self, record: &Record, keywords: &str) -> bool {
        let words: Vec<String> = keywords
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return true;
        }
        let mut fields: Vec<_> = self
            .definition
            .data_fields()
            .filter(|f| f.is_full_text_indexed())
            .collect();
        if fields.is_empty() {
            fields = self
                .definition
                .data_fields()
                .filter(|f| f.property_type() == &PropertyType::String)
                .collect();
        }
        fields.iter().any(|field| {
            record
                .data
                .get(field.name())
                .and_then(|v| v.as_str())
                .map(|text| {
                    let text = text.to_lowercase();
                    words.iter().any(|w| text.contains(w.as_str()))
                })
                .unwrap_or(false)
        })
    }
}

fn without_vectors(record: &Record, include_vectors: bool) -> Record {
    let mut record = record.clone();
    if !include_vectors {
        record.vectors.clear();
    }
    record
}

#[async_trait]
impl VectorStoreCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> &CollectionDefinition {
        &self.definition
    }

    async fn collection_exists(&self) -> Result<bool, DomainError> {
        Ok(self.tables.lock().await.contains_key(&self.name))
    }

    async fn ensure_collection_exists(&self) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().await;
        tables.entry(self.name.clone()).or_default();
        self.persist(&tables).await
    }

    async fn ensure_collection_deleted(&self) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().await;
        if tables.remove(&self.name).is_some() {
            self.persist(&tables).await?;
        }
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<Vec<RecordKey>, DomainError> {
        let mut tables = self.tables.lock().await;
        let table = tables.get_mut(&self.name).ok_or_else(|| self.missing())?;

        // The whole batch is checked and keyed before the table changes.
        for record in records {
            self.check_dimensions(record)?;
        }
        let mut staged: Vec<Record> = Vec::with_capacity(records.len());
        for record in records {
            let key = match record.key() {
                Some(key) => key.clone(),
                None => self.next_key(
                    table
                        .keys()
                        .chain(staged.iter().filter_map(|r| r.key.as_ref())),
                )?,
            };
            let mut stored = record.clone();
            stored.key = Some(key);
            staged.push(stored);
        }

        let mut keys = Vec::with_capacity(staged.len());
        for record in staged {
            if let Some(key) = record.key.clone() {
                keys.push(key.clone());
                table.insert(key, record);
            }
        }

        debug!("Saved {} records to memory collection {}", keys.len(), self.name);
        self.persist(&tables).await?;
        Ok(keys)
    }

    async fn get(
        &self,
        keys: &[RecordKey],
        options: &GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError> {
        let tables = self.tables.lock().await;
        let table = tables.get(&self.name).ok_or_else(|| self.missing())?;
        Ok(keys
            .iter()
            .filter_map(|key| table.get(key))
            .map(|record| without_vectors(record, options.include_vectors))
            .collect())
    }

    async fn delete(&self, keys: &[RecordKey]) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().await;
        let Some(table) = tables.get_mut(&self.name) else {
            return Ok(());
        };
        for key in keys {
            table.remove(key);
        }
        self.persist(&tables).await
    }

    async fn search(&self, query: &VectorSearchQuery) -> Result<VectorSearchResults, DomainError> {
        let options = &query.options;
        options.validate()?;
        if query.vector.is_empty() {
            return Err(DomainError::search("No vector provided for the search"));
        }
        let vector_field = self
            .definition
            .try_get_vector_field(options.vector_property.as_deref())?
            .ok_or_else(|| DomainError::search("The collection has no vector field to search"))?;
        if let Some(expected) = vector_field.dimensions() {
            if query.vector.len() != expected {
                return Err(DomainError::search(format!(
                    "search vector has {} dimensions but '{}' expects {expected}",
                    query.vector.len(),
                    vector_field.name()
                )));
            }
        }
        let function = resolve(vector_field.distance_function());
        let predicate = match &options.filter {
            Some(filter) => Some(InMemoryFilterTranslator.translate(filter, &self.definition)?),
            None => None,
        };

        let mut scored: Vec<(f64, Record)> = {
            let tables = self.tables.lock().await;
            let table = tables.get(&self.name).ok_or_else(|| self.missing())?;
            table
                .values()
                .filter(|record| predicate.as_ref().map_or(true, |p| p.matches(record)))
                .filter(|record| {
                    query
                        .keywords
                        .as_deref()
                        .map_or(true, |k| self.mentions_keywords(record, k))
                })
                .filter_map(|record| {
                    let vector = record.vector(vector_field.name())?;
                    let value = score(function, &query.vector, vector)?;
                    Some((value, without_vectors(record, options.include_vectors)))
                })
                .collect()
        };

        scored.sort_by(|a, b| {
            let ordering = a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal);
            if function.higher_is_closer() {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let total_count = options.include_total_count.then_some(scored.len());
        let results = scored
            .into_iter()
            .skip(options.skip)
            .take(options.top)
            .map(|(value, record)| VectorSearchResult::new(record, Some(value)))
            .collect::<Vec<_>>();
        debug!("Memory search on {} returned {} results", self.name, results.len());

        Ok(VectorSearchResults {
            results,
            total_count,
        })
    }
}
