mod chat_client;
mod embedding_service;
mod filter_translator;
mod vector_store;

pub use chat_client::*;
pub use embedding_service::*;
pub use filter_translator::*;
pub use vector_store::*;
