use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::application::FilterTranslator;
use crate::connector::adapter::{
    MongoDbFilterTranslator, SqlServerFilterTranslator, WeaviateFilterTranslator,
};
use crate::domain::{CollectionDefinition, FilterExpr};

use super::files::load_definition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslateTarget {
    Weaviate,
    Mongodb,
    SqlServer,
}

/// Prints a filter in a store's native syntax without contacting the store.
pub struct TranslateController;

impl TranslateController {
    pub fn translate(
        &self,
        definition: &Path,
        filter: &str,
        target: TranslateTarget,
    ) -> Result<String> {
        let definition = load_definition(definition)?;
        let filter = FilterExpr::from_json_str(filter)?;
        render(&filter, &definition, target)
    }
}

pub fn render(
    filter: &FilterExpr,
    definition: &CollectionDefinition,
    target: TranslateTarget,
) -> Result<String> {
    let output = match target {
        TranslateTarget::Weaviate => WeaviateFilterTranslator.translate(filter, definition)?,
        TranslateTarget::Mongodb => {
            let document = MongoDbFilterTranslator.translate(filter, definition)?;
            let json = mongodb::bson::Bson::Document(document).into_relaxed_extjson();
            serde_json::to_string_pretty(&json)?
        }
        TranslateTarget::SqlServer => {
            let command = SqlServerFilterTranslator.translate(filter, definition)?;
            let mut output = command.text().to_string();
            for (i, parameter) in command.parameters().iter().enumerate() {
                output.push_str(&format!("\n  @P{} = {parameter:?}", i + 1));
            }
            output
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PropertyType, VectorStoreField};

    fn definition() -> CollectionDefinition {
        CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("city", PropertyType::String),
            VectorStoreField::vector("embedding", 3),
        ])
        .unwrap()
    }

    #[test]
    fn sql_output_lists_parameters() {
        let output = render(
            &FilterExpr::eq("city", "Paris"),
            &definition(),
            TranslateTarget::SqlServer,
        )
        .unwrap();
        assert_eq!(output, "[city] = @P1\n  @P1 = String(\"Paris\")");
    }

    #[test]
    fn mongodb_output_is_json() {
        let output = render(
            &FilterExpr::eq("city", "Paris"),
            &definition(),
            TranslateTarget::Mongodb,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value, serde_json::json!({"city": {"$eq": "Paris"}}));
    }

    #[test]
    fn weaviate_rejects_negation() {
        let result = render(
            &FilterExpr::not(FilterExpr::eq("city", "Paris")),
            &definition(),
            TranslateTarget::Weaviate,
        );
        assert!(result.is_err());
    }
}
