use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    ChatController, CollectionsController, RecordsController, SearchController,
    TranslateController,
};

pub struct Router<'a> {
    collections_controller: CollectionsController<'a>,
    records_controller: RecordsController<'a>,
    search_controller: SearchController<'a>,
    chat_controller: ChatController<'a>,
    translate_controller: TranslateController,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            collections_controller: CollectionsController::new(container),
            records_controller: RecordsController::new(container),
            search_controller: SearchController::new(container),
            chat_controller: ChatController::new(container),
            translate_controller: TranslateController,
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Collections => self.collections_controller.list().await,
            Commands::Create {
                collection,
                definition,
            } => self.collections_controller.create(&collection, &definition).await,
            Commands::Drop {
                collection,
                definition,
            } => self.collections_controller.drop_collection(&collection, &definition).await,
            Commands::Upsert {
                collection,
                definition,
                records,
            } => {
                self.records_controller
                    .upsert(&collection, &definition, &records)
                    .await
            }
            Commands::Get {
                collection,
                definition,
                keys,
                include_vectors,
            } => {
                self.records_controller
                    .get(&collection, &definition, &keys, include_vectors)
                    .await
            }
            Commands::Delete {
                collection,
                definition,
                keys,
            } => self.records_controller.delete(&collection, &definition, &keys).await,
            Commands::Search(args) => self.search_controller.search(args).await,
            Commands::Translate {
                definition,
                filter,
                target,
            } => self.translate_controller.translate(&definition, &filter, target),
            Commands::Chat { prompt, system } => {
                self.chat_controller
                    .chat(&prompt, system.as_deref().unwrap_or_default())
                    .await
            }
        }
    }
}
