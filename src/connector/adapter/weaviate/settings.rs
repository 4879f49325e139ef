use crate::domain::DomainError;

const DEFAULT_LOCAL_PORT: u16 = 8080;

/// Connection settings for a Weaviate instance.
///
/// Exactly one mode must be configured:
///
/// | Variable              | Mode   | Purpose                          |
/// |-----------------------|--------|----------------------------------|
/// | `WEAVIATE_URL`        | cloud  | Cluster URL                      |
/// | `WEAVIATE_API_KEY`    | cloud  | Bearer token                     |
/// | `WEAVIATE_LOCAL_HOST` | local  | Host of a self-hosted instance   |
/// | `WEAVIATE_LOCAL_PORT` | local  | Port, `8080` when unset          |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaviateSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub local_host: Option<String>,
    pub local_port: Option<u16>,
}

impl WeaviateSettings {
    pub fn cloud(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn local(host: impl Into<String>, port: u16) -> Self {
        Self {
            local_host: Some(host.into()),
            local_port: Some(port),
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let local_port = match lookup("WEAVIATE_LOCAL_PORT") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
                DomainError::configuration(format!("WEAVIATE_LOCAL_PORT '{raw}' is not a port"))
            })?),
            None => None,
        };
        let settings = Self {
            url: lookup("WEAVIATE_URL").filter(|v| !v.is_empty()),
            api_key: lookup("WEAVIATE_API_KEY").filter(|v| !v.is_empty()),
            local_host: lookup("WEAVIATE_LOCAL_HOST").filter(|v| !v.is_empty()),
            local_port,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn is_cloud(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }

    pub fn is_local(&self) -> bool {
        self.local_host.is_some()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match (self.is_cloud(), self.is_local()) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(DomainError::configuration(
                "Weaviate settings configure both a cloud and a local instance",
            )),
            (false, false) => Err(DomainError::configuration(
                "Weaviate needs WEAVIATE_URL and WEAVIATE_API_KEY, or WEAVIATE_LOCAL_HOST",
            )),
        }
    }

    /// Base URL of the REST API, without a trailing slash.
    pub fn base_url(&self) -> Result<String, DomainError> {
        self.validate()?;
        if let Some(url) = &self.url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let host = self.local_host.as_deref().unwrap_or("localhost");
        let port = self.local_port.unwrap_or(DEFAULT_LOCAL_PORT);
        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(format!("{}:{port}", host.trim_end_matches('/')))
        } else {
            Ok(format!("http://{host}:{port}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn cloud_mode_uses_url() {
        let settings = WeaviateSettings::from_vars(vars(&[
            ("WEAVIATE_URL", "https://cluster.weaviate.network/"),
            ("WEAVIATE_API_KEY", "secret"),
        ]))
        .unwrap();
        assert!(settings.is_cloud());
        assert_eq!(settings.base_url().unwrap(), "https://cluster.weaviate.network");
    }

    #[test]
    fn local_mode_defaults_port() {
        let settings =
            WeaviateSettings::from_vars(vars(&[("WEAVIATE_LOCAL_HOST", "weaviate")])).unwrap();
        assert_eq!(settings.base_url().unwrap(), "http://weaviate:8080");
    }

    #[test]
    fn exactly_one_mode_is_required() {
        assert!(WeaviateSettings::from_vars(vars(&[])).is_err());
        assert!(WeaviateSettings::from_vars(vars(&[
            ("WEAVIATE_URL", "https://x"),
            ("WEAVIATE_API_KEY", "k"),
            ("WEAVIATE_LOCAL_HOST", "localhost"),
        ]))
        .is_err());
        // A URL without a key is not a complete cloud configuration.
        assert!(WeaviateSettings::from_vars(vars(&[("WEAVIATE_URL", "https://x")])).is_err());
    }

    #[test]
    fn bad_port_is_a_configuration_error() {
        let err = WeaviateSettings::from_vars(vars(&[
            ("WEAVIATE_LOCAL_HOST", "localhost"),
            ("WEAVIATE_LOCAL_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }
}
