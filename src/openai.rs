//! Client construction for OpenAI-compatible APIs.

use crate::config::ProviderSettings;
use crate::error::{RagError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint.
///
/// The API key is read from the environment variable named in the settings.
/// A `timeout_secs` of zero disables the request timeout.
pub fn create_client(provider: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(&provider.api_key_env).unwrap_or_default();
    let timeout = match provider.timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    create_client_with(&provider.api_base, &api_key, timeout)
}

/// Create a client against an explicit base URL and key.
pub fn create_client_with(
    api_base: &str,
    api_key: &str,
    timeout: Option<Duration>,
) -> Result<Client<OpenAIConfig>> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let http_client = builder
        .build()
        .map_err(|e| RagError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_defaults() {
        let provider = ProviderSettings::default();
        assert!(create_client(&provider).is_ok());
    }

    #[test]
    fn test_create_client_without_timeout() {
        assert!(create_client_with("http://localhost:8080/v1/", "key", None).is_ok());
    }
}
