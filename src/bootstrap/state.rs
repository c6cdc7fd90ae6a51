//! Shared simulator state.
//!
//! Everything the sessions share, constructed once from configuration:
//! - Credential store (bind authentication)
//! - Outcome selector (round-robin receipt statuses)
//! - Delay sampler (receipt jitter)
//! - Message id generator

use std::sync::Arc;

use rusmpp::types::COctetString;

use crate::config::{Config, ConfigError};
use crate::simulator::{
    CredentialStore, DelaySampler, InMemoryCredentialStore, MessageIdGenerator, StatusSelector,
};
use crate::telemetry::SimulatorStats;

/// Shared simulator state.
///
/// Passed to every session. All fields are thread-safe.
pub struct SimulatorState {
    /// Accepted ESME credentials
    pub credentials: Box<dyn CredentialStore>,
    /// Outcome rotation for delivery receipts
    pub statuses: StatusSelector,
    /// Delay between submit_sm_resp and deliver_sm
    pub delay: DelaySampler,
    /// Message id allocation
    pub message_ids: MessageIdGenerator,
    /// system_id returned in bind responses
    pub system_id: COctetString<1, 16>,
    /// Running totals
    pub stats: SimulatorStats,
}

impl SimulatorState {
    pub fn new(
        credentials: impl CredentialStore + 'static,
        statuses: StatusSelector,
        delay: DelaySampler,
        system_id: COctetString<1, 16>,
    ) -> Self {
        Self {
            credentials: Box::new(credentials),
            statuses,
            delay,
            message_ids: MessageIdGenerator::new(),
            system_id,
            stats: SimulatorStats::new(),
        }
    }

    /// Build the state from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.auth.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        let credentials: InMemoryCredentialStore = config.auth.iter().cloned().collect();
        let statuses = StatusSelector::from_names(&config.delivery.statuses)?;
        let delay = DelaySampler::new(config.delivery.min_delay, config.delivery.max_delay)?;
        let system_id = config.smsc_system_id()?;

        Ok(Self::new(credentials, statuses, delay, system_id))
    }
}

/// Shared simulator state handle.
pub type SharedSimulatorState = Arc<SimulatorState>;
