use async_trait::async_trait;
use tracing::debug;

use crate::application::{ChatClient, EmbeddingService};
use crate::domain::{ChatMessage, ChatSettings, DomainError, EmbeddingConfig};

use super::http::{http_client, send_json, trim_base};
use super::openai_wire::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};

pub const AZURE_OPENAI_DEFAULT_API_VERSION: &str = "2024-10-21";
const PROVIDER: &str = "Azure OpenAI";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureOpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub chat_deployment_name: Option<String>,
    pub embedding_deployment_name: Option<String>,
    pub api_version: String,
}

impl AzureOpenAiSettings {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            chat_deployment_name: None,
            embedding_deployment_name: None,
            api_version: AZURE_OPENAI_DEFAULT_API_VERSION.to_string(),
        }
    }

    /// | Variable                                  | Default      |
    /// |-------------------------------------------|--------------|
    /// | `AZURE_OPENAI_ENDPOINT`                   | required     |
    /// | `AZURE_OPENAI_API_KEY`                    | required     |
    /// | `AZURE_OPENAI_CHAT_DEPLOYMENT_NAME`       | none         |
    /// | `AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME`  | none         |
    /// | `AZURE_OPENAI_API_VERSION`                | `2024-10-21` |
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let endpoint = get("AZURE_OPENAI_ENDPOINT")
            .ok_or_else(|| DomainError::configuration("AZURE_OPENAI_ENDPOINT is not set"))?;
        let api_key = get("AZURE_OPENAI_API_KEY")
            .ok_or_else(|| DomainError::configuration("AZURE_OPENAI_API_KEY is not set"))?;
        let mut settings = Self::new(endpoint, api_key);
        settings.chat_deployment_name = get("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME");
        settings.embedding_deployment_name = get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME");
        if let Some(version) = get("AZURE_OPENAI_API_VERSION") {
            settings.api_version = version;
        }
        Ok(settings)
    }
}

/// Client for Azure OpenAI deployments. Requests are routed by deployment
/// name and authenticated with the `api-key` header.
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    chat_deployment: Option<String>,
    embedding_deployment: Option<String>,
    embedding_config: EmbeddingConfig,
}

impl AzureOpenAiClient {
    pub fn new(settings: AzureOpenAiSettings) -> Self {
        let embedding_config = EmbeddingConfig::new(
            settings.embedding_deployment_name.clone().unwrap_or_default(),
            0,
        );
        Self {
            http: http_client(),
            endpoint: trim_base(&settings.endpoint),
            api_key: settings.api_key,
            api_version: settings.api_version,
            chat_deployment: settings.chat_deployment_name,
            embedding_deployment: settings.embedding_deployment_name,
            embedding_config,
        }
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Ok(Self::new(AzureOpenAiSettings::from_env()?))
    }

    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{deployment}/{operation}?api-version={}",
            self.endpoint, self.api_version
        )
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.http.post(url).header("api-key", &self.api_key)
    }
}

#[async_trait]
impl ChatClient for AzureOpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &ChatSettings,
    ) -> Result<ChatMessage, DomainError> {
        let deployment = settings
            .model
            .as_deref()
            .or(self.chat_deployment.as_deref())
            .ok_or_else(|| {
                DomainError::configuration("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME is not set")
            })?;

        let request = ChatRequest::new(None, messages, settings);
        let url = self.deployment_url(deployment, "chat/completions");
        let response: ChatResponse = send_json(self.post(url).json(&request), PROVIDER).await?;
        debug!("Azure OpenAI chat completion on deployment {deployment}");
        response.into_message(PROVIDER)
    }
}

#[async_trait]
impl EmbeddingService for AzureOpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let deployment = self.embedding_deployment.as_deref().ok_or_else(|| {
            DomainError::configuration("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME is not set")
        })?;

        let request = EmbeddingRequest {
            model: None,
            input: texts,
            dimensions: None,
        };
        let url = self.deployment_url(deployment, "embeddings");
        let response: EmbeddingResponse = send_json(self.post(url).json(&request), PROVIDER).await?;
        let vectors = response.into_vectors();
        debug!("Generated {} Azure OpenAI embeddings on {deployment}", vectors.len());
        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.embedding_config
    }
}
