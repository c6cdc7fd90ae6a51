//! In-process simulator statistics.
//!
//! Plain atomic counters owned by the shared simulator state. The server
//! logs a snapshot when it stops; tests read them directly.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals for one simulator instance.
#[derive(Debug, Default)]
pub struct SimulatorStats {
    active_connections: AtomicU64,
    total_connections: AtomicU64,
    binds_accepted: AtomicU64,
    binds_rejected: AtomicU64,
    messages_submitted: AtomicU64,
    receipts_sent: AtomicU64,
    receipts_cancelled: AtomicU64,
    malformed_pdus: AtomicU64,
}

/// Point-in-time copy of [`SimulatorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub active_connections: u64,
    pub total_connections: u64,
    pub binds_accepted: u64,
    pub binds_rejected: u64,
    pub messages_submitted: u64,
    pub receipts_sent: u64,
    pub receipts_cancelled: u64,
    pub malformed_pdus: u64,
}

impl SimulatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn bind(&self, accepted: bool) {
        let counter = if accepted {
            &self.binds_accepted
        } else {
            &self.binds_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_submitted(&self) {
        self.messages_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A deliver_sm was written to the peer.
    pub fn receipt_sent(&self) {
        self.receipts_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Timers dropped when their session ended.
    pub fn receipts_cancelled(&self, count: u64) {
        self.receipts_cancelled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn malformed_pdu(&self) {
        self.malformed_pdus.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            binds_accepted: self.binds_accepted.load(Ordering::Relaxed),
            binds_rejected: self.binds_rejected.load(Ordering::Relaxed),
            messages_submitted: self.messages_submitted.load(Ordering::Relaxed),
            receipts_sent: self.receipts_sent.load(Ordering::Relaxed),
            receipts_cancelled: self.receipts_cancelled.load(Ordering::Relaxed),
            malformed_pdus: self.malformed_pdus.load(Ordering::Relaxed),
        }
    }
}
