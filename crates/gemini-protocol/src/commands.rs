//! Commands that can be sent to the module.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::fix16::encode_fix16;
use crate::frame::{PayloadEncoding, SysExFrame};
use crate::types::*;
use bytes::BufMut;

/// Commands that can be sent to the Gemini firmware.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ask for the firmware build id.
    Hello,

    /// Ask for the MCU serial number.
    GetSerialNumber,

    /// Put the module into calibration mode.
    EnterCalibration,

    /// Sample one ADC channel.
    ReadAdc {
        /// Channel to sample.
        channel: AdcChannel,
    },

    /// Drive the four DAC outputs directly.
    SetDac {
        /// Output codes, channels A through D.
        codes: [u16; 4],
    },

    /// Set an oscillator's frequency.
    SetFrequency {
        /// Oscillator to retune.
        oscillator: Oscillator,
        /// Frequency in hertz.
        frequency: f64,
    },

    /// Write the raw ADC gain error correction value.
    WriteAdcGain {
        /// Gain scaled by 2048.
        gain: u16,
    },

    /// Write the ADC offset error correction value.
    WriteAdcOffset {
        /// Offset in ADC codes.
        offset: i16,
    },

    /// Turn ADC error correction on or off.
    SetAdcCorrection {
        /// Whether correction is applied.
        enabled: bool,
    },

    /// Restore default settings.
    ResetSettings,

    /// Read the packed settings record.
    ReadSettings,

    /// Write a packed settings record.
    WriteSettings {
        /// Packed record bytes.
        data: Vec<u8>,
    },

    /// Write one ramp look-up table entry.
    WriteLutEntry(LutEntry),

    /// Commit the ramp look-up table to NVM.
    WriteLut,

    /// Erase the ramp look-up table.
    EraseLut,

    /// Start or stop monitor streaming.
    Monitor {
        /// Whether updates should stream.
        enabled: bool,
    },

    /// Restart the firmware.
    SoftReset,

    /// Restart into the bootloader.
    ResetIntoBootloader,
}

impl Command {
    /// The SysEx command identifier for this command.
    pub fn sysex_command(&self) -> SysExCommand {
        match self {
            Command::Hello => SysExCommand::Hello,
            Command::GetSerialNumber => SysExCommand::GetSerialNumber,
            Command::EnterCalibration => SysExCommand::EnterCalibration,
            Command::ReadAdc { .. } => SysExCommand::ReadAdc,
            Command::SetDac { .. } => SysExCommand::SetDac,
            Command::SetFrequency { .. } => SysExCommand::SetFrequency,
            Command::WriteAdcGain { .. } => SysExCommand::WriteAdcGain,
            Command::WriteAdcOffset { .. } => SysExCommand::WriteAdcOffset,
            Command::SetAdcCorrection { enabled: true } => SysExCommand::EnableAdcCorrection,
            Command::SetAdcCorrection { enabled: false } => SysExCommand::DisableAdcCorrection,
            Command::ResetSettings => SysExCommand::ResetSettings,
            Command::ReadSettings => SysExCommand::ReadSettings,
            Command::WriteSettings { .. } => SysExCommand::WriteSettings,
            Command::WriteLutEntry(_) => SysExCommand::WriteLutEntry,
            Command::WriteLut => SysExCommand::WriteLut,
            Command::EraseLut => SysExCommand::EraseLut,
            Command::Monitor { .. } => SysExCommand::Monitor,
            Command::SoftReset => SysExCommand::SoftReset,
            Command::ResetIntoBootloader => SysExCommand::ResetIntoBootloader,
        }
    }

    /// How the request payload is represented on the wire.
    pub fn payload_encoding(&self) -> PayloadEncoding {
        match self {
            Command::SetDac { .. }
            | Command::SetFrequency { .. }
            | Command::WriteAdcGain { .. }
            | Command::WriteAdcOffset { .. }
            | Command::WriteSettings { .. }
            | Command::WriteLutEntry(_) => PayloadEncoding::Teeth,
            _ => PayloadEncoding::Raw,
        }
    }

    /// Whether the firmware answers this command with a frame.
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Command::Hello
                | Command::GetSerialNumber
                | Command::ReadAdc { .. }
                | Command::ReadSettings
                | Command::WriteSettings { .. }
                | Command::WriteLutEntry(_)
        )
    }

    /// Build the frame for this command, before any payload encoding.
    pub fn to_frame(&self) -> SysExFrame {
        let mut buf: Vec<u8> = Vec::new();

        match self {
            Command::Hello
            | Command::GetSerialNumber
            | Command::EnterCalibration
            | Command::SetAdcCorrection { .. }
            | Command::ResetSettings
            | Command::ReadSettings
            | Command::WriteLut
            | Command::EraseLut
            | Command::SoftReset
            | Command::ResetIntoBootloader => {}

            Command::ReadAdc { channel } => {
                buf.put_u8((*channel).into());
            }

            Command::SetDac { codes } => {
                for code in codes {
                    buf.put_u16(*code);
                }
            }

            Command::SetFrequency {
                oscillator,
                frequency,
            } => {
                buf.put_u8((*oscillator).into());
                buf.put_i32(encode_fix16(*frequency));
            }

            Command::WriteAdcGain { gain } => {
                buf.put_u16(*gain);
            }

            Command::WriteAdcOffset { offset } => {
                buf.put_i16(*offset);
            }

            Command::WriteSettings { data } => {
                buf.extend_from_slice(data);
            }

            Command::WriteLutEntry(entry) => {
                buf.put_u8(entry.index);
                buf.put_u32(entry.period);
                buf.put_u16(entry.castor);
                buf.put_u16(entry.pollux);
            }

            Command::Monitor { enabled } => {
                buf.put_u8(if *enabled { MONITOR_ENABLE } else { MONITOR_DISABLE });
            }
        }

        SysExFrame::new(self.sysex_command(), buf)
    }

    /// Encode the command into a frame body ready for the transport.
    pub fn encode(&self) -> Vec<u8> {
        self.to_frame().encode(self.payload_encoding())
    }
}

/// Convert a real ADC gain error into the firmware's raw value.
///
/// The value is scaled by 2048 and truncated toward zero.
pub fn adc_gain_from_real(value: f64) -> ProtocolResult<u16> {
    let scaled = (value * ADC_GAIN_SCALE).trunc();
    if !scaled.is_finite() || scaled < 0.0 || scaled > u16::MAX as f64 {
        return Err(ProtocolError::ValueOutOfRange {
            name: "ADC gain error",
            value,
        });
    }
    Ok(scaled as u16)
}
