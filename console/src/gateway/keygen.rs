//! Keygen calls to network appliances

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{error, info};

use crate::errors::KeyVaultError;
use crate::gateway::error::GatewayError;
use crate::gateway::vault::Credentials;

/// Placeholder replaced by the device IP in the keygen URL template
pub const IP_PLACEHOLDER: &str = "{ip}";

/// Appliance keygen trait for testability
#[async_trait]
pub trait ApplianceKeygen: Send + Sync {
    /// Ask the appliance at `ip` for an API key and return its raw response
    async fn generate_key(&self, ip: &str, credentials: &Credentials) -> Result<String, GatewayError>;
}

/// Keygen over HTTPS with a form-encoded login
///
/// Appliances commonly present self-signed certificates, so certificate
/// verification is disabled for these calls.
pub struct HttpKeygen {
    client: Client,
    url_template: String,
}

impl HttpKeygen {
    pub fn new(url_template: &str, timeout: Duration) -> Result<Self, KeyVaultError> {
        if !url_template.contains(IP_PLACEHOLDER) {
            return Err(KeyVaultError::ConfigError(format!(
                "Appliance URL template must contain {}: {}",
                IP_PLACEHOLDER, url_template
            )));
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    pub fn keygen_url(&self, ip: &str) -> String {
        self.url_template.replace(IP_PLACEHOLDER, ip)
    }
}

#[async_trait]
impl ApplianceKeygen for HttpKeygen {
    async fn generate_key(&self, ip: &str, credentials: &Credentials) -> Result<String, GatewayError> {
        let url = self.keygen_url(ip);
        info!("Connecting to {} as {}...", ip, credentials.username);

        let form = [
            ("user", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Connection to {} failed: {}", ip, e);
                GatewayError::ApplianceUnreachable(e.to_string())
            })?;

        response.text().await.map_err(|e| {
            error!("Reading keygen response from {} failed: {}", ip, e);
            GatewayError::ApplianceUnreachable(e.to_string())
        })
    }
}
