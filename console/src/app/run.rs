//! Console and gateway run loops

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::app::options::{ConsoleOptions, GatewayOptions, LifecycleOptions};
use crate::directory::DeviceDirectory;
use crate::errors::KeyVaultError;
use crate::gateway::handlers::GatewayState;
use crate::gateway::keygen::HttpKeygen;
use crate::gateway::serve::serve;
use crate::gateway::vault::CredentialVault;
use crate::health::probe::{HealthProbe, ServerStatus};
use crate::http::client::HttpClient;
use crate::keys::workflow::KeyRequestWorkflow;
use crate::session::capabilities::{LineInput, Notifier};
use crate::session::commands::parse;
use crate::session::{Capabilities, Flow, Session};
use crate::workers::liveness;

/// Run the operator console until logout, end of input or shutdown
pub async fn run_console(
    options: ConsoleOptions,
    input: Arc<LineInput>,
    capabilities: Capabilities,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), KeyVaultError> {
    info!("Initializing KeyVault console...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let http_client = match HttpClient::new(&options.backend_base_url, options.request_timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return Err(e);
        }
    };

    let (status_tx, status_rx) = watch::channel(ServerStatus::Unknown);

    init_liveness_worker(
        options.liveness_worker.clone(),
        http_client.clone(),
        status_tx,
        &mut shutdown_manager,
        shutdown_tx.subscribe(),
    )?;
    init_status_indicator(
        status_rx.clone(),
        capabilities.notifier.clone(),
        &mut shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    let mut session = Session::new(
        DeviceDirectory::seeded(&options.devices),
        Arc::new(KeyRequestWorkflow::new(http_client)),
        status_rx,
        capabilities.clone(),
        options.session.clone(),
    );
    session.show_devices();

    tokio::pin!(shutdown_signal);
    loop {
        capabilities.screen.prompt(&session.prompt());

        let line = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, shutting down...");
                break;
            }
            line = input.next_line() => line,
        };

        let Some(line) = line else {
            info!("Input closed, shutting down...");
            break;
        };

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                capabilities.notifier.error(&e.to_string());
                continue;
            }
        };

        if session.dispatch(command).await == Flow::Exit {
            tokio::time::sleep(options.lifecycle.logout_delay).await;
            break;
        }
    }

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

/// Run the credential gateway until shutdown
pub async fn run_gateway(
    options: GatewayOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), KeyVaultError> {
    info!("Initializing KeyVault gateway...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let vault = Arc::new(CredentialVault::from_entries(&options.vault));
    info!("Credential vault loaded with {} device(s)", vault.len());
    let keygen = Arc::new(HttpKeygen::new(
        &options.appliance_url,
        options.appliance_timeout,
    )?);
    let state = Arc::new(GatewayState::new(vault, keygen));

    let mut shutdown_rx = shutdown_tx.subscribe();
    let (_, server_handle) = serve(&options.server, state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;
    shutdown_manager.with_server_handle(server_handle)?;

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

fn init_liveness_worker(
    options: liveness::Options,
    http_client: Arc<HttpClient>,
    status_tx: watch::Sender<ServerStatus>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), KeyVaultError> {
    info!("Initializing liveness worker...");

    let probe = HealthProbe::new(http_client);
    let liveness_handle = tokio::spawn(async move {
        liveness::run(
            &options,
            &probe,
            &status_tx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_liveness_worker_handle(liveness_handle)
}

/// Notify the operator when the gateway goes online or offline
fn init_status_indicator(
    mut status_rx: watch::Receiver<ServerStatus>,
    notifier: Arc<dyn Notifier>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), KeyVaultError> {
    let indicator_handle = tokio::spawn(async move {
        let mut last = *status_rx.borrow();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => return,
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }

            let status = *status_rx.borrow_and_update();
            if status == last {
                continue;
            }
            debug!("Indicator {:?} -> {:?}", last, status);
            match status {
                ServerStatus::Online => notifier.success(status.label()),
                ServerStatus::Offline => notifier.error(status.label()),
                ServerStatus::Unknown => {}
            }
            last = status;
        }
    });

    shutdown_manager.with_indicator_handle(indicator_handle)
}

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    liveness_worker_handle: Option<JoinHandle<()>>,
    indicator_handle: Option<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), KeyVaultError>>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            liveness_worker_handle: None,
            indicator_handle: None,
            server_handle: None,
        }
    }

    pub fn with_liveness_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), KeyVaultError> {
        if self.liveness_worker_handle.is_some() {
            return Err(KeyVaultError::ShutdownError(
                "liveness_handle already set".to_string(),
            ));
        }
        self.liveness_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_indicator_handle(&mut self, handle: JoinHandle<()>) -> Result<(), KeyVaultError> {
        if self.indicator_handle.is_some() {
            return Err(KeyVaultError::ShutdownError(
                "indicator_handle already set".to_string(),
            ));
        }
        self.indicator_handle = Some(handle);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), KeyVaultError>>,
    ) -> Result<(), KeyVaultError> {
        if self.server_handle.is_some() {
            return Err(KeyVaultError::ShutdownError(
                "server_handle already set".to_string(),
            ));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), KeyVaultError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}",
                    self.lifecycle_options.max_shutdown_delay
                );
                Err(KeyVaultError::ShutdownError("timed out".to_string()))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), KeyVaultError> {
        info!("Shutting down KeyVault...");

        // 1. Liveness worker
        if let Some(handle) = self.liveness_worker_handle.take() {
            handle
                .await
                .map_err(|e| KeyVaultError::ShutdownError(e.to_string()))?;
        }

        // 2. Indicator
        if let Some(handle) = self.indicator_handle.take() {
            handle
                .await
                .map_err(|e| KeyVaultError::ShutdownError(e.to_string()))?;
        }

        // 3. Gateway server
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| KeyVaultError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
