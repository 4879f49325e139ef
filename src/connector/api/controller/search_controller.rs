use anyhow::Result;

use crate::application::SearchRequest;
use crate::cli::SearchArgs;
use crate::domain::{CollectionDefinition, FilterExpr, VectorSearchOptions, VectorSearchResults};

use super::super::Container;
use super::files::load_definition;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(&self, args: SearchArgs) -> Result<String> {
        let definition = load_definition(&args.definition)?;

        let mut options = VectorSearchOptions::default()
            .with_top(args.top)
            .with_skip(args.skip)
            .with_vectors(args.include_vectors)
            .with_total_count(args.total_count);
        if let Some(raw) = &args.filter {
            options = options.with_filter(FilterExpr::from_json_str(raw)?);
        }
        if let Some(field) = &args.vector_field {
            options = options.with_vector_property(field.clone());
        }

        let mut request = SearchRequest::text(args.query).with_options(options);
        if args.hybrid {
            request = request.hybrid();
        }

        let results = self
            .container
            .search_use_case()
            .execute(&args.collection, definition.clone(), request)
            .await?;
        Ok(format_results(&results, &definition))
    }
}

fn format_results(results: &VectorSearchResults, definition: &CollectionDefinition) -> String {
    if results.results.is_empty() {
        return "No results found.".to_string();
    }

    let mut output = match results.total_count {
        Some(total) => format!("Found {} results ({total} total):\n\n", results.results.len()),
        None => format!("Found {} results:\n\n", results.results.len()),
    };
    for (i, result) in results.results.iter().enumerate() {
        let score = result
            .score
            .map(|s| format!("{s:.4}"))
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!("{}. (score: {score})\n", i + 1));
        output.push_str(&format!("   {}\n", result.record.to_json(definition)));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PropertyType, Record, VectorSearchResult, VectorStoreField};

    #[test]
    fn results_list_scores_and_records() {
        let definition = CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("name", PropertyType::String),
        ])
        .unwrap();
        let results = VectorSearchResults {
            results: vec![VectorSearchResult::new(
                Record::new("a").with_data("name", "Grand"),
                Some(0.5),
            )],
            total_count: Some(4),
        };

        let output = format_results(&results, &definition);
        assert!(output.starts_with("Found 1 results (4 total):"));
        assert!(output.contains("1. (score: 0.5000)"));
        assert!(output.contains(r#"{"id":"a","name":"Grand"}"#));
    }
}
