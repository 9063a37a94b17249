//! Gateway request handlers

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gateway::error::GatewayError;
use crate::gateway::keygen::ApplianceKeygen;
use crate::gateway::vault::{CredentialVault, Credentials};

/// Path prefix of the key resource, `/deviceIp={ip}`
pub const DEVICE_KEY_PREFIX: &str = "deviceIp=";

/// Gateway state shared across handlers
pub struct GatewayState {
    pub vault: Arc<CredentialVault>,
    pub keygen: Arc<dyn ApplianceKeygen>,
}

impl GatewayState {
    pub fn new(vault: Arc<CredentialVault>, keygen: Arc<dyn ApplianceKeygen>) -> Self {
        Self { vault, keygen }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "KeyVault".to_string(),
    })
}

/// Key handler for `/deviceIp={ip}`
///
/// Answers with the appliance's keygen response verbatim.
pub async fn device_key_handler(
    State(state): State<Arc<GatewayState>>,
    Path(target): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    // Any other single-segment path is not a resource of ours
    let ip = target
        .strip_prefix(DEVICE_KEY_PREFIX)
        .ok_or(GatewayError::DeviceNotFound)?;
    parse_ip(ip)?;

    let credentials = state.vault.get(ip).ok_or(GatewayError::UnknownIp)?;
    let body = state.keygen.generate_key(ip, &credentials).await?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// Request body for adding a device to the vault
#[derive(Deserialize)]
pub struct AddDeviceRequest {
    pub ip: String,
    pub username: String,
    pub password: String,
}

/// Result of a vault mutation
#[derive(Debug, Serialize, Deserialize)]
pub struct VaultResponse {
    pub status: String,
    pub message: String,
}

/// Add (or replace) a device in the vault
pub async fn add_device_handler(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<AddDeviceRequest>,
) -> Result<Json<VaultResponse>, GatewayError> {
    parse_ip(&request.ip)?;

    state.vault.insert(
        &request.ip,
        Credentials {
            username: request.username,
            password: SecretString::from(request.password),
        },
    );
    info!("Device {} added to vault", request.ip);

    Ok(Json(VaultResponse {
        status: "success".to_string(),
        message: format!("Device {} added to vault", request.ip),
    }))
}

/// Remove a device from the vault
pub async fn delete_device_handler(
    State(state): State<Arc<GatewayState>>,
    Path(ip): Path<String>,
) -> Result<Json<VaultResponse>, GatewayError> {
    state
        .vault
        .remove(&ip)
        .ok_or(GatewayError::DeviceNotFound)?;
    info!("Device {} deleted from vault", ip);

    Ok(Json(VaultResponse {
        status: "success".to_string(),
        message: format!("Device {} deleted from vault", ip),
    }))
}

/// Accepts any IPv4 or IPv6 literal
fn parse_ip(ip: &str) -> Result<IpAddr, GatewayError> {
    ip.parse().map_err(|_| GatewayError::InvalidIp)
}
