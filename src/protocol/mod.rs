//! SMPP wire support.
//!
//! PDU types and their encoding come from `rusmpp`. This module adds the
//! framing adapter the session runs on, which keeps a malformed body from
//! tearing down the connection, and text access for message bodies.

mod codec;
mod message;

pub use codec::{CodecError, Frame, SmppCodec, MAX_PDU_LENGTH};
pub use message::{is_delivery_receipt, MessageText, DELIVERY_RECEIPT_ESM_CLASS};

pub use rusmpp::command::CommandParts;
pub use rusmpp::{Command, CommandId, CommandStatus, Pdu};
