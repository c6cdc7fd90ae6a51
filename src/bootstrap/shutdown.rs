use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

/// Shutdown state machine
///
/// States:
/// 1. Running - normal operation
/// 2. Draining - stop accepting, sessions close and cancel their timers
/// 3. Terminated - all sessions closed or drain timeout reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Terminated,
}

/// Coordinates graceful shutdown between the server, the acceptor and sessions.
pub struct Shutdown {
    /// Current state
    state: watch::Sender<ShutdownState>,

    /// Drain period duration
    drain_period: Duration,

    /// Active session count
    active_sessions: AtomicU64,
}

impl Shutdown {
    pub fn new(drain_period: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(ShutdownState::Running);

        Arc::new(Self {
            state,
            drain_period,
            active_sessions: AtomicU64::new(0),
        })
    }

    /// Get current state
    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Drain period configured at startup
    pub fn drain_period(&self) -> Duration {
        self.drain_period
    }

    /// Start draining (called on SIGTERM/SIGINT)
    pub fn start_drain(&self) {
        if self.state() != ShutdownState::Running {
            return;
        }

        info!(
            drain_period_ms = self.drain_period.as_millis() as u64,
            active_sessions = self.active_sessions(),
            "starting graceful shutdown drain"
        );

        self.state.send_replace(ShutdownState::Draining);

        if self.active_sessions() == 0 {
            self.terminate();
        }
    }

    /// Complete shutdown
    pub fn terminate(&self) {
        if self.state() == ShutdownState::Terminated {
            return;
        }

        let active = self.active_sessions();
        if active > 0 {
            warn!(active_sessions = active, "force terminating with active sessions");
        }

        info!("shutdown complete");
        self.state.send_replace(ShutdownState::Terminated);
    }

    /// Wait until the state reaches `Terminated`.
    pub async fn terminated(&self) {
        let mut rx = self.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state == ShutdownState::Terminated || rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Register a new session. Returns false while draining.
    pub fn session_opened(&self) -> bool {
        if self.state() != ShutdownState::Running {
            return false;
        }

        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Unregister a session
    pub fn session_closed(&self) {
        let prev = self.active_sessions.fetch_sub(1, Ordering::SeqCst);

        if self.state() == ShutdownState::Draining && prev == 1 {
            info!("all sessions drained");
            self.terminate();
        }
    }

    /// Get active session count
    pub fn active_sessions(&self) -> u64 {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Check if accepting new connections
    pub fn is_accepting(&self) -> bool {
        self.state() == ShutdownState::Running
    }
}
