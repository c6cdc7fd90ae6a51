//! Delivery simulation: the pieces a session uses to fake an SMSC.
//!
//! - Credential checks for binds
//! - Message id allocation
//! - Outcome catalog and round-robin selection
//! - Receipt delay sampling and receipt text rendering

mod auth;
mod catalog;
mod delay;
mod delivery;
mod message_id;
mod receipt;

pub use auth::{CredentialStore, Credentials, InMemoryCredentialStore};
pub use catalog::{OutcomeStatus, StatusCatalog, StatusSelector};
pub use delay::DelaySampler;
pub use delivery::PendingDelivery;
pub use message_id::MessageIdGenerator;
pub use receipt::{ReceiptFormatter, RECEIPT_TEXT_CHARS};
