use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ChatClient, EmbeddingService};
use crate::domain::{ChatMessage, ChatRole, ChatSettings, DomainError, EmbeddingConfig};

use super::http::{http_client, send_json, trim_base};

pub const OLLAMA_DEFAULT_HOST: &str = "http://localhost:11434";
const PROVIDER: &str = "Ollama";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub host: String,
    pub chat_model_id: Option<String>,
    pub embedding_model_id: Option<String>,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: OLLAMA_DEFAULT_HOST.to_string(),
            chat_model_id: None,
            embedding_model_id: None,
        }
    }
}

impl OllamaSettings {
    /// | Variable                     | Default                  |
    /// |------------------------------|--------------------------|
    /// | `OLLAMA_HOST`                | `http://localhost:11434` |
    /// | `OLLAMA_CHAT_MODEL_ID`       | none                     |
    /// | `OLLAMA_EMBEDDING_MODEL_ID`  | none                     |
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            host: get("OLLAMA_HOST").unwrap_or_else(|| OLLAMA_DEFAULT_HOST.to_string()),
            chat_model_id: get("OLLAMA_CHAT_MODEL_ID"),
            embedding_model_id: get("OLLAMA_EMBEDDING_MODEL_ID"),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Options::is_empty")]
    options: Options,
}

#[derive(Serialize, Default)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl Options {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    chat_model: Option<String>,
    embedding_model: Option<String>,
    embedding_config: EmbeddingConfig,
}

impl OllamaClient {
    pub fn new(settings: OllamaSettings) -> Self {
        Self {
            http: http_client(),
            host: trim_base(&settings.host),
            embedding_config: EmbeddingConfig::new(
                settings.embedding_model_id.clone().unwrap_or_default(),
                0,
            ),
            chat_model: settings.chat_model_id,
            embedding_model: settings.embedding_model_id,
        }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaSettings::from_env())
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &ChatSettings,
    ) -> Result<ChatMessage, DomainError> {
        let model = settings
            .model
            .as_deref()
            .or(self.chat_model.as_deref())
            .ok_or_else(|| DomainError::configuration("OLLAMA_CHAT_MODEL_ID is not set"))?;

        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: Options {
                temperature: settings.temperature,
                top_p: settings.top_p,
                num_predict: settings.max_tokens,
            },
        };
        let url = format!("{}/api/chat", self.host);
        let response: ChatResponse =
            send_json(self.http.post(url).json(&request), PROVIDER).await?;
        debug!("Ollama chat completion with {model}");

        Ok(ChatMessage {
            role: ChatRole::Assistant,
            content: response.message.content,
        })
    }
}

#[async_trait]
impl EmbeddingService for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self
            .embedding_model
            .as_deref()
            .ok_or_else(|| DomainError::configuration("OLLAMA_EMBEDDING_MODEL_ID is not set"))?;

        let request = EmbedRequest {
            model,
            input: texts,
        };
        let url = format!("{}/api/embed", self.host);
        let response: EmbedResponse =
            send_json(self.http.post(url).json(&request), PROVIDER).await?;
        if response.embeddings.len() != texts.len() {
            return Err(DomainError::service(format!(
                "Ollama returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }
        debug!("Generated {} Ollama embeddings with {model}", texts.len());
        Ok(response.embeddings)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.embedding_config
    }
}
