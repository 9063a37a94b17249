//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Response};
use tracing::{debug, error};
use url::Url;

use crate::errors::KeyVaultError;

/// HTTP client for gateway communication
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client rooted at `base_url` (the gateway origin)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KeyVaultError> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(KeyVaultError::ConfigError(format!(
                "Unsupported gateway URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Make a GET request and read the body as text
    ///
    /// Non-2xx statuses are returned as [`KeyVaultError::HttpStatus`]
    /// without reading the body.
    pub async fn get_text(&self, path: &str) -> Result<String, KeyVaultError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status("GET", response)?;

        Ok(response.text().await?)
    }

    /// Make a GET request that bypasses caches, discarding the body
    pub async fn get_uncached(&self, path: &str) -> Result<(), KeyVaultError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} (no-cache)", url);

        let response = self
            .client
            .get(&url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;
        check_status("GET", response)?;

        Ok(())
    }
}

fn check_status(method: &str, response: Response) -> Result<Response, KeyVaultError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    error!("HTTP {} {} failed: {}", method, response.url(), status);
    Err(KeyVaultError::HttpStatus {
        code: status.as_u16(),
        reason: status
            .canonical_reason()
            .unwrap_or(status.as_str())
            .to_string(),
    })
}
