use std::path::Path;

use anyhow::Result;

use super::super::Container;
use super::files::load_definition;

pub struct CollectionsController<'a> {
    container: &'a Container,
}

impl<'a> CollectionsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let names = self.container.collections_use_case().list().await?;
        if names.is_empty() {
            return Ok(format!("No collections in {}.", self.container.store_name()));
        }

        let mut output = format!("Collections in {}:\n\n", self.container.store_name());
        for name in names {
            output.push_str(&format!("  {name}\n"));
        }
        Ok(output)
    }

    pub async fn create(&self, collection: &str, definition: &Path) -> Result<String> {
        let definition = load_definition(definition)?;
        self.container
            .collections_use_case()
            .create(collection, definition)
            .await?;
        Ok(format!("Collection {collection} is ready."))
    }

    pub async fn drop_collection(&self, collection: &str, definition: &Path) -> Result<String> {
        let definition = load_definition(definition)?;
        self.container
            .collections_use_case()
            .drop_collection(collection, definition)
            .await?;
        Ok(format!("Collection {collection} dropped."))
    }
}
