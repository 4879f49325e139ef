mod get_records;
mod manage_collections;
mod search_records;
mod upsert_records;

pub use get_records::*;
pub use manage_collections::*;
pub use search_records::*;
pub use upsert_records::*;
