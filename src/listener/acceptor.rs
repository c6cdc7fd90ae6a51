//! TCP acceptor for incoming ESME connections.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::bootstrap::{SharedSimulatorState, Shutdown};

use super::connection::ConnectionId;
use super::session::SmppSession;

/// Listener for accepting incoming SMPP connections.
pub struct Listener {
    /// Bound socket
    listener: TcpListener,

    /// Actual bound address (resolves port 0)
    local_addr: SocketAddr,

    /// Connection ID generator
    next_connection_id: AtomicU64,

    /// Shared simulator state handed to each session
    simulator: SharedSimulatorState,

    /// Shutdown handle
    shutdown: Arc<Shutdown>,
}

impl Listener {
    /// Bind the listening socket.
    pub async fn bind(
        address: SocketAddr,
        simulator: SharedSimulatorState,
        shutdown: Arc<Shutdown>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            next_connection_id: AtomicU64::new(1),
            simulator,
            shutdown,
        })
    }

    /// Get the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop until shutdown starts.
    pub async fn run(self) -> io::Result<()> {
        info!(address = %self.local_addr, "listener started");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    info!(address = %self.local_addr, "listener shutting down");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => self.handle_accept(stream, peer_addr),
                        Err(e) => error!(error = %e, "accept error"),
                    }
                }
            }
        }

        info!(address = %self.local_addr, "listener stopped");
        Ok(())
    }

    /// Spawn a session for an accepted connection.
    fn handle_accept(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let conn_id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::SeqCst));

        let span = span!(Level::INFO, "conn", id = %conn_id, peer = %peer_addr);

        if !self.shutdown.session_opened() {
            debug!(parent: &span, "draining, connection refused");
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            warn!(parent: &span, error = %e, "socket configuration failed");
        }

        debug!(parent: &span, "connection accepted");
        self.simulator.stats.connection_opened();

        let session = SmppSession::new(
            conn_id,
            stream,
            self.simulator.clone(),
            self.shutdown.subscribe(),
        );
        let shutdown = self.shutdown.clone();
        let simulator = self.simulator.clone();

        tokio::spawn(
            async move {
                if let Err(e) = session.run().await {
                    debug!(error = %e, "session ended with error");
                }

                debug!("connection closed");
                simulator.stats.connection_closed();
                shutdown.session_closed();
            }
            .instrument(span),
        );
    }
}
