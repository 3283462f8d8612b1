//! Protocol error types.

use crate::types::SysExCommand;
use std::time::Duration;
use teeth_codec::TeethError;
use thiserror::Error;

/// Errors that can occur when talking to the module.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame has the wrong marker, the wrong length, or a payload that
    /// couldn't be unescaped or unpacked.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// No frame arrived for a command that expects a response.
    #[error("no response to {command} within {timeout:?}")]
    NoResponse {
        /// The command that was waiting.
        command: SysExCommand,
        /// How long it waited.
        timeout: Duration,
    },

    /// ADC channel index outside the nine channels the module has.
    #[error("unsupported ADC channel: {0}")]
    UnsupportedChannel(u8),

    /// Unknown command code.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Argument can't be represented in the command's payload.
    #[error("{name} out of range: {value}")]
    ValueOutOfRange {
        /// Argument name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The MIDI transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ProtocolError {
    pub(crate) fn frame_too_short(expected: usize, actual: usize) -> Self {
        ProtocolError::MalformedFrame(format!(
            "expected at least {} bytes, got {}",
            expected, actual
        ))
    }

    pub(crate) fn wrong_length(command: SysExCommand, expected: usize, actual: usize) -> Self {
        ProtocolError::MalformedFrame(format!(
            "{} response should be {} bytes, got {}",
            command, expected, actual
        ))
    }
}

impl From<TeethError> for ProtocolError {
    fn from(err: TeethError) -> Self {
        ProtocolError::MalformedFrame(format!("teeth decode failed: {}", err))
    }
}

impl From<RecordError> for ProtocolError {
    fn from(err: RecordError) -> Self {
        ProtocolError::MalformedFrame(format!("record unpack failed: {}", err))
    }
}

/// Errors raised by settings and monitor record collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Buffer size doesn't match the record layout.
    #[error("expected {expected} bytes, got {actual}")]
    WrongSize {
        /// Size of the packed record.
        expected: usize,
        /// Size of the buffer.
        actual: usize,
    },

    /// A field held a value the record doesn't allow.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
