//! Gateway liveness probe

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::http::client::HttpClient;

/// Health check resource on the gateway
pub const HEALTH_PATH: &str = "/health";

/// Liveness probe trait for testability
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// True iff the gateway answered with a 2xx status
    async fn check_liveness(&self) -> bool;
}

/// Probe that hits the gateway health resource
pub struct HealthProbe {
    http_client: Arc<HttpClient>,
}

impl HealthProbe {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl LivenessProbe for HealthProbe {
    async fn check_liveness(&self) -> bool {
        match self.http_client.get_uncached(HEALTH_PATH).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }
}

/// Online/offline indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    /// No probe has completed yet
    #[default]
    Unknown,
    Online,
    Offline,
}

impl ServerStatus {
    pub fn from_liveness(alive: bool) -> Self {
        if alive {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Unknown => "Checking...",
            ServerStatus::Online => "Server Online",
            ServerStatus::Offline => "Server Offline",
        }
    }
}
