use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::domain::{DomainError, OperationContext};

use super::WeaviateSettings;

pub(crate) const WEAVIATE_STORE_NAME: &str = "Weaviate";

/// Thin JSON wrapper over the Weaviate REST API, shared by the store and its
/// collections.
#[derive(Clone)]
pub struct WeaviateClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeaviateClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base: String = base_url.into();
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_settings(settings: &WeaviateSettings) -> Result<Self, DomainError> {
        let base_url = settings.base_url()?;
        let api_key = if settings.is_cloud() {
            settings.api_key.clone()
        } else {
            None
        };
        Ok(Self::new(base_url, api_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the JSON body. A 404 on a GET or DELETE
    /// yields `Ok(None)`; on writes and queries it is an error.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        collection: &str,
        operation: &'static str,
    ) -> Result<Option<Value>, DomainError> {
        let url = format!("{}{path}", self.base_url);
        let lookup = method == Method::GET || method == Method::DELETE;
        let mut request = self.http.request(method, &url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .in_operation(WEAVIATE_STORE_NAME, collection, operation)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND && lookup {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Weaviate {operation} on '{collection}' returned {status}: {body}");
            return Err(DomainError::operation(
                WEAVIATE_STORE_NAME,
                collection,
                operation,
                format!("HTTP {status}: {body}"),
            ));
        }

        let text = response
            .text()
            .await
            .in_operation(WEAVIATE_STORE_NAME, collection, operation)?;
        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        let value =
            serde_json::from_str(&text).in_operation(WEAVIATE_STORE_NAME, collection, operation)?;
        Ok(Some(value))
    }
}
