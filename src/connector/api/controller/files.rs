//! Loading definitions and records from disk.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::domain::CollectionDefinition;

/// Reads a `{"fields": [...]}` JSON document.
pub fn load_definition(path: &Path) -> Result<CollectionDefinition> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read definition {}", path.display()))?;
    let definition = serde_json::from_str(&raw)
        .with_context(|| format!("invalid definition {}", path.display()))?;
    Ok(definition)
}

/// Reads records as a JSON array, a single JSON object, or JSON Lines.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records {}", path.display()))?;

    if let Ok(value) = serde_json::from_str::<Value>(&raw) {
        return match value {
            Value::Array(items) => Ok(items),
            Value::Object(_) => Ok(vec![value]),
            other => bail!("records must be JSON objects, got {other}"),
        };
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON", path.display(), number + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn records_load_from_json_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "a"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id": "b"}}"#).unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], "b");
    }

    #[test]
    fn records_load_from_an_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "a"}}, {{"id": "b"}}, {{"id": "c"}}]"#).unwrap();
        assert_eq!(load_records(file.path()).unwrap().len(), 3);
    }

    #[test]
    fn invalid_definition_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fields": []}}"#).unwrap();
        let err = load_definition(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid definition"));
    }
}
