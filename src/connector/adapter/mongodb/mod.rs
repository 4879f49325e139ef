//! MongoDB Atlas connector built on the official driver.

mod collection;
mod filter_translator;
pub mod query_builder;
mod record_mapper;
mod settings;
mod store;

pub use collection::*;
pub use filter_translator::*;
pub use record_mapper::*;
pub use settings::*;
pub use store::*;
