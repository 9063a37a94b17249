//! Gateway HTTP server setup

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::KeyVaultError;
use crate::gateway::handlers::{
    add_device_handler, delete_device_handler, device_key_handler, health_handler, GatewayState,
};

/// Gateway server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

/// Build the gateway router
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Keys, `/deviceIp={ip}`
        .route("/{target}", get(device_key_handler))
        // Vault
        .route("/add-device", post(add_device_handler))
        .route("/delete-device/{ip}", delete(delete_device_handler))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Start the gateway server
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn serve(
    options: &ServerOptions,
    state: Arc<GatewayState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, JoinHandle<Result<(), KeyVaultError>>), KeyVaultError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| KeyVaultError::ServerError(format!("Unable to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    info!("Starting KeyVault gateway on {}", local_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| KeyVaultError::ServerError(e.to_string()))
    });

    Ok((local_addr, handle))
}
