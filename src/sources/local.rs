//! HTTP client for the local development server.

use crate::error::{ConfigError, Result};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Well-known port of the local development server.
pub const DEFAULT_LOCAL_PORT: u16 = 10641;

/// Local development configuration source.
///
/// Stands in for the parameter store when the environment is `local`: the
/// server at `url` holds the whole configuration document, which is returned
/// as-is.
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::sources::LocalSource;
/// use std::time::Duration;
///
/// # async fn example() -> paramstore_config::error::Result<()> {
/// let source = LocalSource::builder()
///     .with_port(10641)
///     .with_timeout(Duration::from_secs(2))
///     .build()?;
///
/// let document = source.fetch().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalSource {
    url: String,
    client: Client,
}

impl LocalSource {
    /// Create a new builder for constructing a local source.
    pub fn builder() -> LocalSourceBuilder {
        LocalSourceBuilder::new()
    }

    /// The URL this source reads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the whole configuration document.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the request fails or the server answers with
    /// a non-success status, and `DeserializationError` if the body is not JSON.
    pub async fn fetch(&self) -> Result<JsonValue> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFailure(format!("HTTP request failed: {}", e)))?;

        read_json(response).await
    }

    /// Merge `document` into the server's configuration and return the result.
    ///
    /// # Errors
    ///
    /// Same as [`LocalSource::fetch`].
    pub async fn publish(&self, document: &JsonValue) -> Result<JsonValue> {
        let response = self
            .client
            .post(&self.url)
            .json(document)
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFailure(format!("HTTP request failed: {}", e)))?;

        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<JsonValue> {
    let status = response.status();
    if !status.is_success() {
        return Err(ConfigError::RemoteFailure(format!(
            "HTTP request failed with status {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ConfigError::DeserializationError(format!("Failed to parse JSON: {}", e)))
}

/// Builder for constructing a [`LocalSource`].
pub struct LocalSourceBuilder {
    url: Option<String>,
    port: u16,
    timeout: Duration,
}

impl LocalSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            port: DEFAULT_LOCAL_PORT,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the port on `localhost` to talk to.
    ///
    /// Ignored when an explicit URL is set.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set an explicit URL, overriding the port.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the request timeout.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the local source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<LocalSource> {
        let url = self
            .url
            .unwrap_or_else(|| format!("http://localhost:{}/", self.port));

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(LocalSource { url, client })
    }
}

impl Default for LocalSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
