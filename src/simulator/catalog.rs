//! Delivery outcome catalog and the round-robin outcome selector.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ConfigError;

/// A named delivery outcome and the receipt stat/err pair it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutcomeStatus {
    pub name: &'static str,
    pub stat: &'static str,
    pub err: &'static str,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.stat, self.err)
    }
}

const fn outcome(name: &'static str, stat: &'static str, err: &'static str) -> OutcomeStatus {
    OutcomeStatus { name, stat, err }
}

static OUTCOMES: [OutcomeStatus; 14] = [
    outcome("delivered", "DELIVRD", "0"),
    outcome("provider_failure", "UNKNOWN", "47"),
    outcome("undelivered", "UNDELIV", "35"),
    outcome("phone_not_exists", "REJECTD", "53"),
    outcome("billing_error", "REJECTD", "56"),
    outcome("spam_rejected", "REJECTD", "57"),
    outcome("flooding", "REJECTD", "58"),
    outcome("blacklisted", "REJECTD", "60"),
    outcome("retrying", "ACCEPTD", "68"),
    outcome("canceled", "REJECTD", "82"),
    outcome("expired", "EXPIRED", "88"),
    outcome("deleted_by_sender", "DELETED", "95"),
    outcome("deleted_by_admin", "DELETED", "96"),
    outcome("invalid_format", "REJECTD", "778"),
];

/// The fixed table of known outcomes.
pub struct StatusCatalog;

impl StatusCatalog {
    /// All known outcomes in catalog order.
    pub fn all() -> &'static [OutcomeStatus] {
        &OUTCOMES
    }

    /// Look up an outcome by name.
    pub fn lookup(name: &str) -> Result<OutcomeStatus, ConfigError> {
        OUTCOMES
            .iter()
            .find(|o| o.name == name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownStatus(name.to_string()))
    }

    /// Resolve an ordered list of names, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<OutcomeStatus>, ConfigError> {
        names.iter().map(|n| Self::lookup(n.as_ref().trim())).collect()
    }
}

/// Round-robin cursor over the configured outcomes.
///
/// Shared by every session; the cursor advance is a single atomic update so
/// concurrent delivery timers never skip or repeat an index.
#[derive(Debug)]
pub struct StatusSelector {
    outcomes: Vec<OutcomeStatus>,
    cursor: AtomicUsize,
}

impl StatusSelector {
    pub fn new(outcomes: Vec<OutcomeStatus>) -> Result<Self, ConfigError> {
        if outcomes.is_empty() {
            return Err(ConfigError::NoStatuses);
        }
        Ok(Self {
            outcomes,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Build a selector from outcome names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        Self::new(StatusCatalog::resolve(names)?)
    }

    /// Return the outcome at the cursor and advance it.
    pub fn next(&self) -> OutcomeStatus {
        let len = self.outcomes.len();
        let index = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        self.outcomes[index]
    }

    pub fn outcomes(&self) -> &[OutcomeStatus] {
        &self.outcomes
    }
}
