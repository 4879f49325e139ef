pub mod chat_controller;
pub mod collections_controller;
pub mod files;
pub mod records_controller;
pub mod search_controller;
pub mod translate_controller;

pub use chat_controller::ChatController;
pub use collections_controller::CollectionsController;
pub use records_controller::RecordsController;
pub use search_controller::SearchController;
pub use translate_controller::{TranslateController, TranslateTarget};
