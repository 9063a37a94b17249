//! Application configuration options

use std::time::Duration;

use crate::directory::Device;
use crate::gateway::serve::ServerOptions;
use crate::keys::result::ResultPolicy;
use crate::session::SessionOptions;
use crate::storage::settings::{Settings, VaultEntry};
use crate::workers::liveness;

/// Console options
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Gateway origin
    pub backend_base_url: String,

    /// Timeout for a single gateway request
    pub request_timeout: Duration,

    /// Devices shown at startup
    pub devices: Vec<Device>,

    /// Session options
    pub session: SessionOptions,

    /// Liveness worker options
    pub liveness_worker: liveness::Options,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "http://localhost:8090".to_string(),
            request_timeout: Duration::from_secs(30),
            devices: Vec::new(),
            session: SessionOptions::default(),
            liveness_worker: liveness::Options::default(),
        }
    }
}

impl From<&Settings> for ConsoleOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: Duration::from_secs(settings.backend.request_timeout_secs),
            devices: settings.devices.clone(),
            session: SessionOptions {
                download_dir: settings.download_dir.clone(),
                result_policy: if settings.strict_result_ordering {
                    ResultPolicy::DiscardStale
                } else {
                    ResultPolicy::LastWriterWins
                },
            },
            liveness_worker: liveness::Options {
                interval: Duration::from_secs(settings.health_interval_secs),
            },
            ..Default::default()
        }
    }
}

/// Gateway options
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Keygen URL template
    pub appliance_url: String,

    /// Timeout for the appliance keygen call
    pub appliance_timeout: Duration,

    /// Initial vault contents
    pub vault: Vec<VaultEntry>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            appliance_url: "https://{ip}/api/?type=keygen".to_string(),
            appliance_timeout: Duration::from_secs(10),
            vault: Vec::new(),
        }
    }
}

impl From<&Settings> for GatewayOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            server: ServerOptions {
                host: settings.gateway.host.clone(),
                port: settings.gateway.port,
            },
            appliance_url: settings.gateway.appliance_url.clone(),
            appliance_timeout: Duration::from_secs(settings.gateway.appliance_timeout_secs),
            vault: settings.gateway.vault.clone(),
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Pause between the logout notification and exit
    pub logout_delay: Duration,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            logout_delay: Duration::from_millis(500),
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}
