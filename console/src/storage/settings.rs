//! Settings file management

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::Device;
use crate::errors::KeyVaultError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// KeyVault settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Gateway connection used by the console
    #[serde(default)]
    pub backend: BackendSettings,

    /// Liveness probe interval in seconds
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,

    /// Directory exported key files are written to
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Drop key results that complete after a newer request was issued
    #[serde(default)]
    pub strict_result_ordering: bool,

    /// Devices listed in the console at startup
    #[serde(default = "default_devices")]
    pub devices: Vec<Device>,

    /// Gateway server configuration
    #[serde(default)]
    pub gateway: GatewaySettings,
}

fn default_health_interval() -> u64 {
    30
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_devices() -> Vec<Device> {
    vec![
        Device::new("192.0.2.10", "admin"),
        Device::new("192.0.2.11", "admin"),
        Device::new("198.51.100.20", "netops"),
        Device::new("198.51.100.21", "netops"),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            backend: BackendSettings::default(),
            health_interval_secs: default_health_interval(),
            download_dir: default_download_dir(),
            strict_result_ordering: false,
            devices: default_devices(),
            gateway: GatewaySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `file`, falling back to defaults when it is absent
    pub async fn load(file: &File) -> Result<Self, KeyVaultError> {
        if !file.exists().await {
            info!(
                "No settings file at {}, using defaults",
                file.path().display()
            );
            return Ok(Self::default());
        }

        file.read_json().await.map_err(|e| {
            KeyVaultError::ConfigError(format!(
                "Failed to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })
    }
}

/// Gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Origin of the gateway, e.g. `http://localhost:8090`
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Timeout for a single request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Gateway server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Host to bind to
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Keygen URL template; `{ip}` is replaced by the device IP
    #[serde(default = "default_appliance_url")]
    pub appliance_url: String,

    /// Timeout for the appliance keygen call in seconds
    #[serde(default = "default_appliance_timeout")]
    pub appliance_timeout_secs: u64,

    /// Credentials per device IP
    #[serde(default)]
    pub vault: Vec<VaultEntry>,
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8090
}

fn default_appliance_url() -> String {
    "https://{ip}/api/?type=keygen".to_string()
}

fn default_appliance_timeout() -> u64 {
    10
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            appliance_url: default_appliance_url(),
            appliance_timeout_secs: default_appliance_timeout(),
            vault: Vec::new(),
        }
    }
}

/// Appliance credentials held by the gateway
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultEntry {
    pub ip: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for VaultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultEntry")
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
