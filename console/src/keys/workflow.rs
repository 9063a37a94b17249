//! API key request workflow

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::KeyVaultError;
use crate::http::client::HttpClient;
use crate::keys::extract::{extract_key, extract_status};
use crate::keys::result::KeyRequestResult;

/// Description used when the response body carries no usable key
pub const EXTRACTION_FAILED: &str = "Failed to extract API key from response";

/// Status value marking a successful keygen response
const SUCCESS_STATUS: &str = "success";

/// Key requester trait for testability
#[async_trait]
pub trait KeyRequester: Send + Sync {
    /// Request an API key for the device at `ip`
    ///
    /// The IP must already have passed
    /// [`validate_ip_format`](crate::keys::ip::validate_ip_format).
    /// Every failure is folded into the returned result.
    async fn request_api_key(&self, ip: &str) -> KeyRequestResult;
}

/// Key requests against the gateway's `/deviceIp={ip}` resource
pub struct KeyRequestWorkflow {
    http_client: Arc<HttpClient>,
}

impl KeyRequestWorkflow {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl KeyRequester for KeyRequestWorkflow {
    async fn request_api_key(&self, ip: &str) -> KeyRequestResult {
        info!("Requesting API key for {}", ip);

        let path = format!("/deviceIp={}", ip);
        match self.http_client.get_text(&path).await {
            Ok(body) => interpret_response(ip, body),
            Err(e) => {
                warn!("API key request for {} failed: {}", ip, e);
                KeyRequestResult::failure(ip, describe_error(&e))
            }
        }
    }
}

/// Turn a transport-success body into a result
pub fn interpret_response(ip: &str, body: String) -> KeyRequestResult {
    let status = extract_status(&body);
    let key = extract_key(&body).filter(|k| !k.is_empty());

    match (status, key) {
        (Some(SUCCESS_STATUS), Some(key)) => {
            let key = key.to_string();
            debug!("Extracted API key for {} ({} chars)", ip, key.len());
            KeyRequestResult::success(ip, key, body)
        }
        _ => {
            warn!(
                "No API key in response for {} (status: {:?}, key present: {})",
                ip,
                status,
                key.is_some()
            );
            KeyRequestResult::failure_with_body(ip, EXTRACTION_FAILED, body)
        }
    }
}

fn describe_error(err: &KeyVaultError) -> String {
    match err {
        KeyVaultError::HttpError(e) => e.to_string(),
        other => other.to_string(),
    }
}
