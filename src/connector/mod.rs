//! # Connector Layer
//!
//! External integrations implementing the application interfaces:
//! - Vector stores (Weaviate, MongoDB Atlas, SQL Server, in-memory)
//! - LLM providers (OpenAI, Azure OpenAI, Ollama, mock embeddings)
//! - The CLI-facing API (container, router, controllers)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
