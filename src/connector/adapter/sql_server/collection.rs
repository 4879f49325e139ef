use std::sync::Arc;

use async_trait::async_trait;
use tiberius::{Client, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::Compat;
use tracing::debug;

use crate::application::{FilterTranslator, VectorStoreCollection};
use crate::domain::{
    CollectionDefinition, DomainError, GetRecordOptions, OperationContext, PropertyType, Record,
    RecordKey, SearchType, VectorSearchQuery, VectorSearchResult, VectorSearchResults,
};

use super::command::{SqlCommand, SQL_PARAMETER_SAFETY_MAX_COUNT};
use super::query_builder::{
    build_create_table, build_delete, build_drop_table, build_merge, build_search, build_select,
    build_table_exists, split_collection_name,
};
use super::record_mapper::column_to_value;
use super::{SqlServerFilterTranslator, SqlServerRecordMapper};

pub(crate) const SQL_SERVER_STORE_NAME: &str = "SQL Server";

pub type SqlServerClient = Client<Compat<TcpStream>>;

/// A SQL Server table with `VECTOR` columns.
pub struct SqlServerCollection {
    client: Arc<Mutex<SqlServerClient>>,
    name: String,
    schema: String,
    table: String,
    definition: CollectionDefinition,
    mapper: SqlServerRecordMapper,
}

impl SqlServerCollection {
    /// `name` is `table` or `schema.table`.
    pub fn new(
        client: Arc<Mutex<SqlServerClient>>,
        name: &str,
        definition: CollectionDefinition,
    ) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::invalid_input("collection name cannot be empty"));
        }
        match definition.key_field().property_type() {
            PropertyType::String | PropertyType::Int => {}
            other => {
                return Err(DomainError::invalid_model(format!(
                    "SQL Server keys must be strings or integers, not {other}"
                )))
            }
        }
        let (schema, table) = split_collection_name(name);
        Ok(Self {
            client,
            name: name.to_string(),
            schema,
            table,
            definition,
            mapper: SqlServerRecordMapper,
        })
    }

    async fn query(
        &self,
        command: &SqlCommand,
        operation: &'static str,
    ) -> Result<Vec<Row>, DomainError> {
        let params = command.to_sql_params();
        let mut client = self.client.lock().await;
        let stream = client
            .query(command.text(), &params)
            .await
            .in_operation(SQL_SERVER_STORE_NAME, &self.name, operation)?;
        let results = stream
            .into_results()
            .await
            .in_operation(SQL_SERVER_STORE_NAME, &self.name, operation)?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn execute(
        &self,
        command: &SqlCommand,
        operation: &'static str,
    ) -> Result<u64, DomainError> {
        let params = command.to_sql_params();
        let mut client = self.client.lock().await;
        let result = client
            .execute(command.text(), &params)
            .await
            .in_operation(SQL_SERVER_STORE_NAME, &self.name, operation)?;
        Ok(result.total())
    }

    fn row_columns(row: Row) -> Vec<(String, tiberius::ColumnData<'static>)> {
        let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        names.into_iter().zip(row).collect()
    }

    fn rows_per_batch(&self) -> usize {
        (SQL_PARAMETER_SAFETY_MAX_COUNT / self.definition.fields().len().max(1)).max(1)
    }
}

#[async_trait]
impl VectorStoreCollection for SqlServerCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> &CollectionDefinition {
        &self.definition
    }

    async fn collection_exists(&self) -> Result<bool, DomainError> {
        let command = build_table_exists(&self.schema, &self.table)?;
        let rows = self.query(&command, "collection_exists").await?;
        Ok(!rows.is_empty())
    }

    async fn ensure_collection_exists(&self) -> Result<(), DomainError> {
        let command = build_create_table(&self.schema, &self.table, &self.definition, true)?;
        self.execute(&command, "create_collection").await?;
        debug!("Ensured SQL Server table {}.{}", self.schema, self.table);
        Ok(())
    }

    async fn ensure_collection_deleted(&self) -> Result<(), DomainError> {
        let command = build_drop_table(&self.schema, &self.table);
        self.execute(&command, "delete_collection").await?;
        debug!("Dropped SQL Server table {}.{}", self.schema, self.table);
        Ok(())
    }

    async fn upsert(&self, records: &[Record]) -> Result<Vec<RecordKey>, DomainError> {
        let mut keys = Vec::with_capacity(records.len());
        for batch in records.chunks(self.rows_per_batch()) {
            let rows = batch
                .iter()
                .map(|record| {
                    self.mapper
                        .to_row(record, &self.definition)
                        .map(|(_, row)| row)
                })
                .collect::<Result<Vec<_>, _>>()?;
            let command = build_merge(&self.schema, &self.table, &self.definition, rows)?;

            for row in self.query(&command, "upsert").await? {
                if let Some(column) = row.into_iter().next() {
                    keys.push(RecordKey::from_value(&column_to_value(column)?)?);
                }
            }
        }
        debug!("Upserted {} rows into {}", keys.len(), self.name);
        Ok(keys)
    }

    async fn get(
        &self,
        keys: &[RecordKey],
        options: &GetRecordOptions,
    ) -> Result<Vec<Record>, DomainError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut records = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(SQL_PARAMETER_SAFETY_MAX_COUNT) {
            let command = build_select(
                &self.schema,
                &self.table,
                &self.definition,
                chunk,
                options.include_vectors,
            )?;
            for row in self.query(&command, "get").await? {
                let (record, _) = self.mapper.from_columns(
                    Self::row_columns(row),
                    &self.definition,
                    options.include_vectors,
                )?;
                records.push(record);
            }
        }
        debug!("Fetched {} of {} rows from {}", records.len(), keys.len(), self.name);
        Ok(records)
    }

    async fn delete(&self, keys: &[RecordKey]) -> Result<(), DomainError> {
        let mut deleted = 0;
        for chunk in keys.chunks(SQL_PARAMETER_SAFETY_MAX_COUNT) {
            let command = build_delete(&self.schema, &self.table, &self.definition, chunk)?;
            deleted += self.execute(&command, "delete").await?;
        }
        debug!("Deleted {deleted} rows from {}", self.name);
        Ok(())
    }

    async fn search(&self, query: &VectorSearchQuery) -> Result<VectorSearchResults, DomainError> {
        let options = &query.options;
        options.validate()?;
        if query.search_type() == SearchType::KeywordHybrid {
            return Err(DomainError::search(
                "Keyword hybrid search is not supported by SQL Server",
            ));
        }
        if query.vector.is_empty() {
            return Err(DomainError::search("No vector provided for the search"));
        }
        let vector_field = self
            .definition
            .try_get_vector_field(options.vector_property.as_deref())?
            .ok_or_else(|| DomainError::search("The collection has no vector field to search"))?;

        let filter = match &options.filter {
            Some(filter) => Some(SqlServerFilterTranslator.translate(filter, &self.definition)?),
            None => None,
        };
        let command = build_search(
            &self.schema,
            &self.table,
            &self.definition,
            vector_field,
            &query.vector,
            options,
            filter,
        )?;

        let mut results = Vec::new();
        for row in self.query(&command, "search").await? {
            let (record, score) = self.mapper.from_columns(
                Self::row_columns(row),
                &self.definition,
                options.include_vectors,
            )?;
            results.push(VectorSearchResult::new(record, score));
        }
        debug!("SQL Server search on {} returned {} results", self.name, results.len());

        let total_count = options.include_total_count.then_some(results.len());
        Ok(VectorSearchResults {
            results,
            total_count,
        })
    }
}
