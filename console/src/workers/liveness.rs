//! Liveness worker for the online/offline indicator

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::health::probe::{LivenessProbe, ServerStatus};

/// Liveness worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Interval between probes
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Run the liveness worker
///
/// Probes once immediately, then once per interval until shutdown. Every
/// probe result is published, even if unchanged.
pub async fn run<P, S, F>(
    options: &Options,
    probe: &P,
    status_tx: &watch::Sender<ServerStatus>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    P: LivenessProbe + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Liveness worker starting...");

    loop {
        let status = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Liveness worker shutting down...");
                return;
            }
            alive = probe.check_liveness() => ServerStatus::from_liveness(alive),
        };

        let previous = status_tx.send_replace(status);
        if previous != status {
            match status {
                ServerStatus::Offline => warn!("Gateway is offline"),
                _ => info!("Gateway status: {}", status.label()),
            }
        } else {
            debug!("Gateway status unchanged: {}", status.label());
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Liveness worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with probe
            }
        }
    }
}
