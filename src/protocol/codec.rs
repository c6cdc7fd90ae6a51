//! Length-prefixed framing for SMPP PDUs.
//!
//! Framing is done here so that one bad body costs one PDU, not the
//! connection. Each complete frame is cut from the read buffer first and
//! only then handed to `rusmpp` to decode.

use std::io;

use bytes::BytesMut;
use rusmpp::tokio_codec::{CommandCodec, DecodeError, EncodeError};
use rusmpp::{Command, CommandId};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

const HEADER_LENGTH: usize = 16;

/// Upper bound on command_length accepted from a peer.
pub const MAX_PDU_LENGTH: usize = 64 * 1024;

/// Codec error types.
///
/// Both are fatal for the connection: after either one the byte stream can
/// no longer be split into PDUs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid command_length: {0}")]
    InvalidLength(usize),
}

impl From<EncodeError> for CodecError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Io(e) => CodecError::Io(e),
            other => CodecError::Io(io::Error::other(other)),
        }
    }
}

/// One inbound PDU.
#[derive(Debug)]
pub enum Frame {
    /// Fully decoded command.
    Command(Command),

    /// Correctly framed, but the body did not decode. The header fields are
    /// still known, so the PDU can be answered.
    Malformed {
        id: CommandId,
        sequence_number: u32,
        error: DecodeError,
    },
}

impl Frame {
    pub fn id(&self) -> CommandId {
        match self {
            Frame::Command(command) => command.id(),
            Frame::Malformed { id, .. } => *id,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::Command(command) => command.sequence_number(),
            Frame::Malformed {
                sequence_number, ..
            } => *sequence_number,
        }
    }
}

/// SMPP codec for `tokio_util::codec::Framed`.
///
/// Decodes into [`Frame`] and encodes [`Command`].
#[derive(Debug)]
pub struct SmppCodec {
    inner: CommandCodec,
}

impl SmppCodec {
    pub fn new() -> Self {
        Self {
            inner: CommandCodec::new().without_max_length(),
        }
    }
}

impl Default for SmppCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u32(frame: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ])
}

impl Decoder for SmppCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let length = read_u32(src, 0) as usize;
        if !(HEADER_LENGTH..=MAX_PDU_LENGTH).contains(&length) {
            return Err(CodecError::InvalidLength(length));
        }

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(length);
        let id = CommandId::from(read_u32(&frame, 4));
        let sequence_number = read_u32(&frame, 12);

        match self.inner.decode(&mut frame) {
            Ok(Some(command)) => Ok(Some(Frame::Command(command))),
            // The frame holds exactly command_length bytes.
            Ok(None) => Err(CodecError::InvalidLength(length)),
            Err(error) => Ok(Some(Frame::Malformed {
                id,
                sequence_number,
                error,
            })),
        }
    }
}

impl Encoder<Command> for SmppCodec {
    type Error = CodecError;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode(&command, dst)?;
        Ok(())
    }
}
