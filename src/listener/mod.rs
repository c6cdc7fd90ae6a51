//! Listener module for accepting incoming SMPP connections.
//!
//! - The acceptor binds the address and spawns one session task per connection
//! - Sessions own their delivery timers and are the only writer of their socket

mod acceptor;
mod connection;
mod session;

pub use acceptor::Listener;
pub use connection::{BindKind, ConnectionId, SessionState};
pub use session::{SessionError, SmppSession};
