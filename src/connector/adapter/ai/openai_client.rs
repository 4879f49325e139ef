use async_trait::async_trait;
use tracing::debug;

use crate::application::{ChatClient, EmbeddingService};
use crate::domain::{ChatMessage, ChatSettings, DomainError, EmbeddingConfig};

use super::http::{http_client, send_json, trim_base};
use super::openai_wire::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";
const PROVIDER: &str = "OpenAI";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub org_id: Option<String>,
    pub base_url: Option<String>,
    pub chat_model_id: Option<String>,
    pub embedding_model_id: Option<String>,
    pub embedding_dimensions: Option<usize>,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// | Variable                       | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `OPENAI_API_KEY`               | required                 |
    /// | `OPENAI_ORG_ID`                | none                     |
    /// | `OPENAI_BASE_URL`              | `https://api.openai.com` |
    /// | `OPENAI_CHAT_MODEL_ID`         | none                     |
    /// | `OPENAI_EMBEDDING_MODEL_ID`    | none                     |
    /// | `OPENAI_EMBEDDING_DIMENSIONS`  | model default            |
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| DomainError::configuration("OPENAI_API_KEY is not set"))?;
        let embedding_dimensions = match get("OPENAI_EMBEDDING_DIMENSIONS") {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                DomainError::configuration(format!(
                    "OPENAI_EMBEDDING_DIMENSIONS must be a positive integer, got '{raw}'"
                ))
            })?),
            None => None,
        };
        Ok(Self {
            api_key,
            org_id: get("OPENAI_ORG_ID"),
            base_url: get("OPENAI_BASE_URL"),
            chat_model_id: get("OPENAI_CHAT_MODEL_ID"),
            embedding_model_id: get("OPENAI_EMBEDDING_MODEL_ID"),
            embedding_dimensions,
        })
    }
}

/// Client for the OpenAI chat completions and embeddings endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    org_id: Option<String>,
    chat_model: Option<String>,
    embedding_model: Option<String>,
    embedding_config: EmbeddingConfig,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Self {
        let base_url = settings
            .base_url
            .as_deref()
            .map(trim_base)
            .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string());
        let embedding_config = EmbeddingConfig::new(
            settings.embedding_model_id.clone().unwrap_or_default(),
            settings.embedding_dimensions.unwrap_or(0),
        );
        Self {
            http: http_client(),
            base_url,
            api_key: settings.api_key,
            org_id: settings.org_id,
            chat_model: settings.chat_model_id,
            embedding_model: settings.embedding_model_id,
            embedding_config,
        }
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Ok(Self::new(OpenAiSettings::from_env()?))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key);
        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }
        request
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &ChatSettings,
    ) -> Result<ChatMessage, DomainError> {
        let model = settings
            .model
            .as_deref()
            .or(self.chat_model.as_deref())
            .ok_or_else(|| DomainError::configuration("OPENAI_CHAT_MODEL_ID is not set"))?;

        let request = ChatRequest::new(Some(model), messages, settings);
        let response: ChatResponse =
            send_json(self.post("/v1/chat/completions").json(&request), PROVIDER).await?;
        debug!("OpenAI chat completion with {model} for {} messages", messages.len());
        response.into_message(PROVIDER)
    }
}

#[async_trait]
impl EmbeddingService for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self
            .embedding_model
            .as_deref()
            .ok_or_else(|| DomainError::configuration("OPENAI_EMBEDDING_MODEL_ID is not set"))?;

        let request = EmbeddingRequest {
            model: Some(model),
            input: texts,
            dimensions: (self.embedding_config.dimensions() > 0)
                .then_some(self.embedding_config.dimensions()),
        };
        let response: EmbeddingResponse =
            send_json(self.post("/v1/embeddings").json(&request), PROVIDER).await?;
        let vectors = response.into_vectors();
        debug!("Generated {} OpenAI embeddings with {model}", vectors.len());
        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.embedding_config
    }
}
