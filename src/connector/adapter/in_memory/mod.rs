//! In-process vector store used by the tests and by `kconnect --store memory`.

mod collection;
mod distance;
mod filter_translator;
mod snapshot;
mod store;

pub use collection::InMemoryCollection;
pub use filter_translator::*;
pub use store::*;
