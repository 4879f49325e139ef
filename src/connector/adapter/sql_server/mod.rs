//! SQL Server 2025 connector: tables with `VECTOR` columns queried through
//! `VECTOR_DISTANCE`, over a single `tiberius` connection.

mod collection;
pub mod command;
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
