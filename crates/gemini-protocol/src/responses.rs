//! Responses from the module.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{PayloadEncoding, SysExFrame};
use crate::types::SysExCommand;

/// Responses received from the Gemini firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Firmware build id (reply to HELLO).
    FirmwareVersion(String),

    /// MCU serial number as lowercase hex.
    SerialNumber(String),

    /// Raw ADC reading.
    AdcReading(u16),

    /// Packed settings record.
    Settings(Vec<u8>),

    /// Acknowledgement with no meaningful payload.
    Ack,
}

impl Response {
    /// Payload encoding the firmware uses when replying to `command`.
    pub fn encoding_for(command: SysExCommand) -> PayloadEncoding {
        match command {
            SysExCommand::GetSerialNumber
            | SysExCommand::ReadAdc
            | SysExCommand::ReadSettings
            | SysExCommand::Monitor => PayloadEncoding::Teeth,
            _ => PayloadEncoding::Raw,
        }
    }

    /// Decode the reply to `command` from a received message.
    pub fn decode(command: SysExCommand, data: &[u8]) -> ProtocolResult<Self> {
        let frame = SysExFrame::decode(data, Self::encoding_for(command))?;

        if frame.command != command {
            log::warn!(
                "Response to {} arrived with command {}",
                command,
                frame.command
            );
        }

        let payload = frame.payload;

        match command {
            SysExCommand::Hello => Ok(Response::FirmwareVersion(decode_ascii(&payload)?)),

            SysExCommand::GetSerialNumber => Ok(Response::SerialNumber(hex::encode(payload))),

            SysExCommand::ReadAdc => {
                if payload.len() != ADC_READING_SIZE {
                    return Err(ProtocolError::wrong_length(
                        command,
                        ADC_READING_SIZE,
                        payload.len(),
                    ));
                }
                Ok(Response::AdcReading(u16::from_be_bytes([payload[0], payload[1]])))
            }

            SysExCommand::ReadSettings => Ok(Response::Settings(payload)),

            _ => Ok(Response::Ack),
        }
    }
}

fn decode_ascii(payload: &[u8]) -> ProtocolResult<String> {
    if !payload.is_ascii() {
        return Err(ProtocolError::MalformedFrame(
            "firmware version is not ASCII".to_string(),
        ));
    }
    // ASCII is always valid UTF-8.
    Ok(payload.iter().map(|&b| b as char).collect())
}
