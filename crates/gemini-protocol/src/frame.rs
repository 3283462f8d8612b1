//! SysEx frame encoding/decoding.
//!
//! Every Gemini message is a MIDI System Exclusive message carrying the
//! vendor marker, a command byte, and an optional payload:
//!
//! ```text
//! +------+--------+---------+-------------------+------+
//! | 0xF0 | marker | command | payload[0..N]     | 0xF7 |
//! +------+--------+---------+-------------------+------+
//! ```
//!
//! The start and end status bytes belong to the MIDI transport. The frame
//! codec produces the body (marker, command, payload) and accepts either a
//! bare body or a complete message when decoding, since MIDI backends differ
//! in whether they hand the status bytes through.
//!
//! Payloads of commands that carry arbitrary 8-bit data are teeth-encoded so
//! no payload byte can be mistaken for a status byte.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::SysExCommand;
use bytes::BufMut;

/// How a frame's payload is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    /// Payload bytes are already 7-bit and sent as-is.
    #[default]
    Raw,
    /// Payload bytes are teeth-encoded.
    Teeth,
}

/// A decoded Gemini SysEx frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysExFrame {
    /// Command the frame belongs to.
    pub command: SysExCommand,
    /// Payload with any teeth encoding removed.
    pub payload: Vec<u8>,
}

impl SysExFrame {
    /// Create a frame with a payload.
    pub fn new(command: SysExCommand, payload: impl Into<Vec<u8>>) -> Self {
        SysExFrame {
            command,
            payload: payload.into(),
        }
    }

    /// Create a frame with no payload.
    pub fn empty(command: SysExCommand) -> Self {
        SysExFrame {
            command,
            payload: Vec::new(),
        }
    }

    /// Encode the frame body: marker, command, then the payload.
    pub fn encode(&self, encoding: PayloadEncoding) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            FRAME_HEADER_SIZE + teeth_codec::encoded_len(self.payload.len()),
        );
        buf.put_u8(SYSEX_MARKER);
        buf.put_u8(self.command.code());
        match encoding {
            PayloadEncoding::Raw => buf.extend_from_slice(&self.payload),
            PayloadEncoding::Teeth => buf.extend_from_slice(&teeth_codec::encode(&self.payload)),
        }
        buf
    }

    /// Wrap a frame body in the SysEx start and end status bytes.
    pub fn to_message(body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(body.len() + 2);
        buf.put_u8(SYSEX_START);
        buf.extend_from_slice(body);
        buf.put_u8(SYSEX_END);
        buf
    }

    /// Decode a frame body or a complete SysEx message.
    pub fn decode(data: &[u8], encoding: PayloadEncoding) -> ProtocolResult<Self> {
        let body = sysex_body(data);

        if body.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::frame_too_short(FRAME_HEADER_SIZE, body.len()));
        }

        if body[0] != SYSEX_MARKER {
            return Err(ProtocolError::MalformedFrame(format!(
                "expected marker 0x{:02X}, got 0x{:02X}",
                SYSEX_MARKER, body[0]
            )));
        }

        let command = SysExCommand::try_from(body[1]).map_err(|_| {
            ProtocolError::MalformedFrame(format!("unknown command 0x{:02X}", body[1]))
        })?;
        let payload = match encoding {
            PayloadEncoding::Raw => body[FRAME_HEADER_SIZE..].to_vec(),
            PayloadEncoding::Teeth => teeth_codec::decode(&body[FRAME_HEADER_SIZE..])?,
        };

        Ok(SysExFrame { command, payload })
    }
}

/// Strip the SysEx status bytes from a complete message.
///
/// The end byte is only a terminator when the start byte is present; a bare
/// body is taken whole, so a raw payload may end in 0xF7.
fn sysex_body(data: &[u8]) -> &[u8] {
    match data.strip_prefix(&[SYSEX_START]) {
        Some(inner) => inner.strip_suffix(&[SYSEX_END]).unwrap_or(inner),
        None => data,
    }
}
