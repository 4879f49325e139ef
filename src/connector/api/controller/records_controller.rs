use std::path::Path;

use anyhow::Result;

use crate::domain::{CollectionDefinition, GetRecordOptions, RecordKey};

use super::super::Container;
use super::files::{load_definition, load_records};

pub struct RecordsController<'a> {
    container: &'a Container,
}

impl<'a> RecordsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn upsert(
        &self,
        collection: &str,
        definition: &Path,
        records: &Path,
    ) -> Result<String> {
        let definition = load_definition(definition)?;
        let values = load_records(records)?;
        let keys = self
            .container
            .upsert_use_case()
            .execute(collection, definition, values)
            .await?;

        let mut output = format!("Upserted {} records into {collection}:\n", keys.len());
        for key in keys {
            output.push_str(&format!("  {key}\n"));
        }
        Ok(output)
    }

    pub async fn get(
        &self,
        collection: &str,
        definition: &Path,
        keys: &[String],
        include_vectors: bool,
    ) -> Result<String> {
        let definition = load_definition(definition)?;
        let keys = parse_keys(&definition, keys)?;
        let options = GetRecordOptions { include_vectors };
        let records = self
            .container
            .get_use_case()
            .get(collection, definition.clone(), &keys, options)
            .await?;

        if records.is_empty() {
            return Ok("No records found.".to_string());
        }
        let values: Vec<_> = records.iter().map(|r| r.to_json(&definition)).collect();
        Ok(serde_json::to_string_pretty(&values)?)
    }

    pub async fn delete(
        &self,
        collection: &str,
        definition: &Path,
        keys: &[String],
    ) -> Result<String> {
        let definition = load_definition(definition)?;
        let keys = parse_keys(&definition, keys)?;
        self.container
            .get_use_case()
            .delete(collection, definition, &keys)
            .await?;
        Ok(format!("Deleted {} keys from {collection}.", keys.len()))
    }
}

fn parse_keys(definition: &CollectionDefinition, raw: &[String]) -> Result<Vec<RecordKey>> {
    let key_type = definition.key_field().property_type();
    Ok(raw
        .iter()
        .map(|k| RecordKey::parse(k, key_type))
        .collect::<Result<Vec<_>, _>>()?)
}
