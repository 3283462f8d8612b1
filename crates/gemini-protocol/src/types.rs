//! Common types used in the protocol.

use crate::constants::*;
use crate::error::ProtocolError;
use std::fmt;

/// SysEx command identifiers understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SysExCommand {
    Hello,
    WriteAdcGain,
    WriteAdcOffset,
    ReadAdc,
    SetDac,
    ResetSettings,
    WriteLutEntry,
    WriteLut,
    EraseLut,
    DisableAdcCorrection,
    EnableAdcCorrection,
    GetSerialNumber,
    Monitor,
    SoftReset,
    EnterCalibration,
    ResetIntoBootloader,
    ReadSettings,
    WriteSettings,
    SetFrequency,
}

impl SysExCommand {
    /// Every command, in opcode order.
    pub const ALL: [SysExCommand; 19] = [
        SysExCommand::Hello,
        SysExCommand::WriteAdcGain,
        SysExCommand::WriteAdcOffset,
        SysExCommand::ReadAdc,
        SysExCommand::SetDac,
        SysExCommand::ResetSettings,
        SysExCommand::WriteLutEntry,
        SysExCommand::WriteLut,
        SysExCommand::EraseLut,
        SysExCommand::DisableAdcCorrection,
        SysExCommand::EnableAdcCorrection,
        SysExCommand::GetSerialNumber,
        SysExCommand::Monitor,
        SysExCommand::SoftReset,
        SysExCommand::EnterCalibration,
        SysExCommand::ResetIntoBootloader,
        SysExCommand::ReadSettings,
        SysExCommand::WriteSettings,
        SysExCommand::SetFrequency,
    ];

    /// The opcode sent on the wire.
    pub fn code(self) -> u8 {
        self.into()
    }
}

impl From<SysExCommand> for u8 {
    fn from(command: SysExCommand) -> Self {
        match command {
            SysExCommand::Hello => CMD_HELLO,
            SysExCommand::WriteAdcGain => CMD_WRITE_ADC_GAIN,
            SysExCommand::WriteAdcOffset => CMD_WRITE_ADC_OFFSET,
            SysExCommand::ReadAdc => CMD_READ_ADC,
            SysExCommand::SetDac => CMD_SET_DAC,
            SysExCommand::ResetSettings => CMD_RESET_SETTINGS,
            SysExCommand::WriteLutEntry => CMD_WRITE_LUT_ENTRY,
            SysExCommand::WriteLut => CMD_WRITE_LUT,
            SysExCommand::EraseLut => CMD_ERASE_LUT,
            SysExCommand::DisableAdcCorrection => CMD_DISABLE_ADC_CORR,
            SysExCommand::EnableAdcCorrection => CMD_ENABLE_ADC_CORR,
            SysExCommand::GetSerialNumber => CMD_GET_SERIAL_NUMBER,
            SysExCommand::Monitor => CMD_MONITOR,
            SysExCommand::SoftReset => CMD_SOFT_RESET,
            SysExCommand::EnterCalibration => CMD_ENTER_CALIBRATION,
            SysExCommand::ResetIntoBootloader => CMD_RESET_INTO_BOOTLOADER,
            SysExCommand::ReadSettings => CMD_READ_SETTINGS,
            SysExCommand::WriteSettings => CMD_WRITE_SETTINGS,
            SysExCommand::SetFrequency => CMD_SET_FREQ,
        }
    }
}

impl TryFrom<u8> for SysExCommand {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            CMD_HELLO => SysExCommand::Hello,
            CMD_WRITE_ADC_GAIN => SysExCommand::WriteAdcGain,
            CMD_WRITE_ADC_OFFSET => SysExCommand::WriteAdcOffset,
            CMD_READ_ADC => SysExCommand::ReadAdc,
            CMD_SET_DAC => SysExCommand::SetDac,
            CMD_RESET_SETTINGS => SysExCommand::ResetSettings,
            CMD_WRITE_LUT_ENTRY => SysExCommand::WriteLutEntry,
            CMD_WRITE_LUT => SysExCommand::WriteLut,
            CMD_ERASE_LUT => SysExCommand::EraseLut,
            CMD_DISABLE_ADC_CORR => SysExCommand::DisableAdcCorrection,
            CMD_ENABLE_ADC_CORR => SysExCommand::EnableAdcCorrection,
            CMD_GET_SERIAL_NUMBER => SysExCommand::GetSerialNumber,
            CMD_MONITOR => SysExCommand::Monitor,
            CMD_SOFT_RESET => SysExCommand::SoftReset,
            CMD_ENTER_CALIBRATION => SysExCommand::EnterCalibration,
            CMD_RESET_INTO_BOOTLOADER => SysExCommand::ResetIntoBootloader,
            CMD_READ_SETTINGS => SysExCommand::ReadSettings,
            CMD_WRITE_SETTINGS => SysExCommand::WriteSettings,
            CMD_SET_FREQ => SysExCommand::SetFrequency,
            other => return Err(ProtocolError::UnknownCommand(other)),
        })
    }
}

impl fmt::Display for SysExCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, self.code())
    }
}

/// Analog channels the firmware can sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdcChannel {
    /// Castor pulse width CV.
    DutyA = 0,
    /// Castor pulse width knob.
    DutyAPot = 1,
    /// Pollux pulse width CV.
    DutyB = 2,
    /// Pollux pulse width knob.
    DutyBPot = 3,
    ChorusPot = 4,
    CvAPot = 5,
    CvBPot = 6,
    /// Castor pitch CV input.
    CvA = 7,
    /// Pollux pitch CV input.
    CvB = 8,
}

impl AdcChannel {
    /// Every channel, in index order.
    pub const ALL: [AdcChannel; ADC_CHANNEL_COUNT] = [
        AdcChannel::DutyA,
        AdcChannel::DutyAPot,
        AdcChannel::DutyB,
        AdcChannel::DutyBPot,
        AdcChannel::ChorusPot,
        AdcChannel::CvAPot,
        AdcChannel::CvBPot,
        AdcChannel::CvA,
        AdcChannel::CvB,
    ];
}

impl From<AdcChannel> for u8 {
    fn from(channel: AdcChannel) -> Self {
        channel as u8
    }
}

impl TryFrom<u8> for AdcChannel {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AdcChannel::ALL
            .get(value as usize)
            .copied()
            .ok_or(ProtocolError::UnsupportedChannel(value))
    }
}

/// The module's two oscillators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Oscillator {
    Castor = 0,
    Pollux = 1,
}

impl From<Oscillator> for u8 {
    fn from(osc: Oscillator) -> Self {
        osc as u8
    }
}

/// Whether the firmware is streaming monitor updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Disabled,
    Enabled,
}

/// One row of the ramp look-up table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutEntry {
    /// Position in the table.
    pub index: u8,
    /// Oscillator timer period this row applies to.
    pub period: u32,
    /// Castor ramp charge DAC code.
    pub castor: u16,
    /// Pollux ramp charge DAC code.
    pub pollux: u16,
}
