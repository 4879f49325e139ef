mod chat;
mod definition;
mod embedding;
mod filter;
mod record;
mod search;

pub use chat::*;
pub use definition::*;
pub use embedding::*;
pub use filter::*;
pub use record::*;
pub use search::*;
