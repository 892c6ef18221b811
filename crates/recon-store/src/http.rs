//! REST adapter for the external user source
//!
//! `GET {api_url}/{lookup_key}` returning `{"userId": ..., "name": ...}`.
//! Retries are the driver's business; this adapter makes exactly one request.

use crate::contract::ExternalUserSource;
use crate::error::SourceError;
use async_trait::async_trait;
use recon_model::ExternalIdentity;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL; the lookup key is appended as the last path segment
    #[serde(default)]
    pub api_url: String,
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl SourceConfig {
    /// Configuration for `api_url` with default timeouts
    #[inline]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// [`ExternalUserSource`] backed by a REST endpoint
#[derive(Debug, Clone)]
pub struct HttpUserSource {
    base_url: Url,
    client: Client,
}

impl HttpUserSource {
    /// Build the adapter
    ///
    /// # Errors
    /// `SourceError::Configuration` if `api_url` is missing or not a usable base
    /// URL, or the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.api_url.is_empty() {
            return Err(SourceError::Configuration("api_url is not set".to_string()));
        }
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| SourceError::Configuration(format!("api_url '{}': {e}", config.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Configuration(format!(
                "api_url '{}' cannot be a base URL",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SourceError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    /// URL queried for `lookup_key`; the key is percent-encoded as one segment
    ///
    /// # Errors
    /// `SourceError::Configuration` if the base URL cannot take path segments.
    pub fn lookup_url(&self, lookup_key: &str) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::Configuration("api_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(lookup_key);
        Ok(url)
    }
}

/// Map a non-success status to a source error
fn classify_status(status: StatusCode, lookup_key: &str) -> SourceError {
    if status == StatusCode::NOT_FOUND {
        SourceError::NotFound {
            lookup_key: lookup_key.to_string(),
        }
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        SourceError::unavailable(format!("upstream answered {status}"))
    } else {
        SourceError::InvalidResponse(format!("upstream answered {status}"))
    }
}

#[async_trait]
impl ExternalUserSource for HttpUserSource {
    async fn get(&self, lookup_key: &str) -> Result<ExternalIdentity, SourceError> {
        let url = self.lookup_url(lookup_key)?;
        tracing::debug!(url = %url, "fetching external user");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::unavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, lookup_key));
        }

        let identity: ExternalIdentity = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("GET {url}: {e}")))?;
        tracing::debug!(user_id = %identity.id, "external user fetched");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_appends_encoded_key() {
        let source = HttpUserSource::new(&SourceConfig::new("https://example.test/prod/users/")).unwrap();
        assert_eq!(
            source.lookup_url("42").unwrap().as_str(),
            "https://example.test/prod/users/42"
        );
        assert_eq!(
            source.lookup_url("a/b").unwrap().as_str(),
            "https://example.test/prod/users/a%2Fb"
        );
    }

    #[test]
    fn missing_api_url_is_configuration_error() {
        assert!(matches!(
            HttpUserSource::new(&SourceConfig::default()),
            Err(SourceError::Configuration(_))
        ));
        assert!(matches!(
            HttpUserSource::new(&SourceConfig::new("mailto:someone")),
            Err(SourceError::Configuration(_))
        ));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "k"),
            SourceError::NotFound { .. }
        ));
        assert!(classify_status(StatusCode::BAD_GATEWAY, "k").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "k").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "k").is_transient());
    }

    #[test]
    fn config_defaults_from_toml_like_json() {
        let cfg: SourceConfig = serde_json::from_str(r#"{"api_url":"http://x"}"#).unwrap();
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.connect_timeout_secs, 5);
    }
}
