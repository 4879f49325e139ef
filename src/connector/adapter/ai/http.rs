use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::DomainError;

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_default()
}

/// Sends a request and decodes a JSON reply. Non-success statuses are logged
/// with their body and returned as [`DomainError::Service`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T, DomainError> {
    let response = request
        .send()
        .await
        .map_err(|e| DomainError::service(format!("{provider}: request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!("{provider}: API returned {status}: {body}");
        return Err(DomainError::service(format!(
            "{provider}: API returned {status}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| DomainError::service(format!("{provider}: failed to parse response: {e}")))
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
