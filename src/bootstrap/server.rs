use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, span, warn, Instrument, Level};

use crate::config::Config;
use crate::listener::Listener;

use super::shutdown::Shutdown;
use super::state::{SharedSimulatorState, SimulatorState};

/// Main smppsim server
///
/// Components:
/// - Listener: accept loop, one session task per connection
/// - Simulator state: credentials, outcome rotation, delays, message ids
/// - Shutdown: graceful drain with configurable timeout
pub struct Server {
    /// Configuration
    config: Arc<Config>,

    /// Shared simulator state
    simulator: SharedSimulatorState,

    /// Shutdown coordinator
    shutdown: Arc<Shutdown>,
}

impl Server {
    /// Create a new server instance from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        let simulator =
            SimulatorState::from_config(&config).context("invalid simulator configuration")?;
        let shutdown = Shutdown::new(config.shutdown.drain_timeout);

        Ok(Self {
            config: Arc::new(config),
            simulator: Arc::new(simulator),
            shutdown,
        })
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<Listener> {
        let address = self.config.listen_addr();
        Listener::bind(address, self.simulator.clone(), self.shutdown.clone())
            .await
            .with_context(|| format!("failed to bind {}", address))
    }

    /// Run the server until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, wait_for_signal()).await
    }

    /// Serve `listener` until `stop` completes, then drain.
    pub async fn serve<F>(self, listener: Listener, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let span = span!(Level::INFO, "smppsim", version = env!("CARGO_PKG_VERSION"));

        async move {
            let delivery = &self.config.delivery;
            info!(
                address = %listener.local_addr(),
                system_id = self.simulator.system_id.as_str(),
                statuses = ?delivery.statuses,
                min_delay_ms = delivery.min_delay.as_millis() as u64,
                max_delay_ms = delivery.max_delay.as_millis() as u64,
                credentials = self.config.auth.len(),
                "smppsim server started"
            );

            let listener_handle = tokio::spawn(
                async move {
                    if let Err(e) = listener.run().await {
                        error!(error = %e, "listener failed");
                    }
                }
                .in_current_span(),
            );

            stop.await;

            info!("shutdown signal received, starting graceful shutdown");
            self.shutdown.start_drain();

            let drain_timeout = self.shutdown.drain_period();
            if tokio::time::timeout(drain_timeout, self.shutdown.terminated())
                .await
                .is_err()
            {
                warn!(
                    active_sessions = self.shutdown.active_sessions(),
                    "drain timeout reached, forcing shutdown"
                );
            }
            self.shutdown.terminate();

            if let Err(e) = listener_handle.await {
                warn!(error = %e, "listener task failed");
            }

            let stats = self.simulator.stats.snapshot();
            info!(
                connections = stats.total_connections,
                binds_accepted = stats.binds_accepted,
                binds_rejected = stats.binds_rejected,
                messages_submitted = stats.messages_submitted,
                receipts_sent = stats.receipts_sent,
                receipts_cancelled = stats.receipts_cancelled,
                malformed_pdus = stats.malformed_pdus,
                "smppsim server stopped"
            );
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Get the shared simulator state
    pub fn simulator(&self) -> SharedSimulatorState {
        self.simulator.clone()
    }

    /// Get shutdown coordinator
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("received SIGTERM");
        }
    }
}
