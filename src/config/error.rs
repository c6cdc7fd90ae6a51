use std::time::Duration;

use thiserror::Error;

/// Configuration error.
///
/// Every variant is fatal at startup; none of them can occur while serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Outcome name not present in the status catalog.
    #[error("unknown status name: {0}")]
    UnknownStatus(String),

    /// No outcome configured.
    #[error("at least one status must be configured")]
    NoStatuses,

    /// Delay lower bound above upper bound.
    #[error("minimum delay ({min:?}) is greater than maximum delay ({max:?})")]
    InvalidDelayRange { min: Duration, max: Duration },

    /// Delay that is negative or not a number.
    #[error("invalid delay: {0}")]
    InvalidDelay(String),

    /// Credential entry that is not `system_id:password`.
    #[error("malformed credential entry: {0:?}")]
    MalformedCredential(String),

    /// system_id that does not fit a bind response.
    #[error("invalid system_id {0:?}: expected 1 to 15 ASCII characters")]
    InvalidSystemId(String),

    /// Empty credential table.
    #[error("at least one credential must be configured")]
    NoCredentials,
}
