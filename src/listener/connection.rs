//! Connection identity and session state.

use std::fmt;

use rusmpp::pdus::{BindReceiverResp, BindTransceiverResp, BindTransmitterResp};
use rusmpp::types::COctetString;

use crate::protocol::{CommandId, Pdu};

/// Unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection established, awaiting bind
    Connected,
    /// Bind received, credentials being checked
    Authenticating,
    /// Bound as transmitter
    BoundTx,
    /// Bound as receiver
    BoundRx,
    /// Bound as transceiver
    BoundTrx,
    /// Connection closed
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connected => write!(f, "CONNECTED"),
            SessionState::Authenticating => write!(f, "AUTHENTICATING"),
            SessionState::BoundTx => write!(f, "BOUND_TX"),
            SessionState::BoundRx => write!(f, "BOUND_RX"),
            SessionState::BoundTrx => write!(f, "BOUND_TRX"),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}

impl SessionState {
    /// Check if this state is any bound state.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::BoundTx | Self::BoundRx | Self::BoundTrx)
    }

    /// Check if this state may be sent delivery receipts.
    pub fn can_receive(&self) -> bool {
        matches!(self, Self::BoundRx | Self::BoundTrx)
    }

    /// Check if this state may submit messages.
    pub fn can_send(&self) -> bool {
        matches!(self, Self::BoundTx | Self::BoundTrx)
    }
}

/// The three bind flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Transmitter,
    Receiver,
    Transceiver,
}

impl BindKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transmitter => "transmitter",
            Self::Receiver => "receiver",
            Self::Transceiver => "transceiver",
        }
    }

    /// State entered after a successful bind.
    pub fn bound_state(&self) -> SessionState {
        match self {
            Self::Transmitter => SessionState::BoundTx,
            Self::Receiver => SessionState::BoundRx,
            Self::Transceiver => SessionState::BoundTrx,
        }
    }

    pub fn response_command(&self) -> CommandId {
        match self {
            Self::Transmitter => CommandId::BindTransmitterResp,
            Self::Receiver => CommandId::BindReceiverResp,
            Self::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    /// The bind_*_resp PDU answering this bind, carrying the SMSC system_id.
    pub fn response(&self, system_id: COctetString<1, 16>) -> Pdu {
        match self {
            Self::Transmitter => BindTransmitterResp::new(system_id, None).into(),
            Self::Receiver => BindReceiverResp::new(system_id, None).into(),
            Self::Transceiver => BindTransceiverResp::new(system_id, None).into(),
        }
    }
}
