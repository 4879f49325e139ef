//! LLM provider clients: chat completions and embeddings.

mod azure_openai_client;
mod http;
mod mock_embedding;
mod ollama_client;
mod openai_client;
mod openai_wire;

pub use azure_openai_client::*;
pub use mock_embedding::*;
pub use ollama_client::*;
pub use openai_client::*;
