//! Protocol constants
//!
//! Command codes, framing bytes and scale factors shared with the Gemini
//! firmware. Command codes are part of the wire contract with deployed
//! firmware and must never be renumbered.

use std::time::Duration;

// ============================================================================
// Framing
// ============================================================================

/// MIDI System Exclusive start status byte.
pub const SYSEX_START: u8 = 0xF0;
/// MIDI System Exclusive end status byte; terminates every frame.
pub const SYSEX_END: u8 = 0xF7;
/// Vendor marker identifying Gemini SysEx messages.
pub const SYSEX_MARKER: u8 = 0x77;
/// Marker plus command byte.
pub const FRAME_HEADER_SIZE: usize = 2;

/// Name of the MIDI port the module enumerates as.
pub const MIDI_PORT_NAME: &str = "Gemini";

// ============================================================================
// Command Codes (host → firmware)
// ============================================================================

/// Handshake; the reply carries the firmware build id.
pub const CMD_HELLO: u8 = 0x01;
/// Write the ADC gain error correction value.
pub const CMD_WRITE_ADC_GAIN: u8 = 0x02;
/// Write the ADC offset error correction value.
pub const CMD_WRITE_ADC_OFFSET: u8 = 0x03;
/// Sample one ADC channel.
pub const CMD_READ_ADC: u8 = 0x04;
/// Set the four DAC outputs.
pub const CMD_SET_DAC: u8 = 0x05;
/// Restore default settings.
pub const CMD_RESET_SETTINGS: u8 = 0x07;
/// Write a single ramp look-up table entry.
pub const CMD_WRITE_LUT_ENTRY: u8 = 0x0A;
/// Commit the ramp look-up table to NVM.
pub const CMD_WRITE_LUT: u8 = 0x0B;
/// Erase the ramp look-up table.
pub const CMD_ERASE_LUT: u8 = 0x0C;
/// Disable ADC error correction.
pub const CMD_DISABLE_ADC_CORR: u8 = 0x0D;
/// Enable ADC error correction.
pub const CMD_ENABLE_ADC_CORR: u8 = 0x0E;
/// Read the MCU serial number.
pub const CMD_GET_SERIAL_NUMBER: u8 = 0x0F;
/// Enable or disable monitor (telemetry) streaming.
pub const CMD_MONITOR: u8 = 0x10;
/// Restart the firmware.
pub const CMD_SOFT_RESET: u8 = 0x11;
/// Enter calibration mode.
pub const CMD_ENTER_CALIBRATION: u8 = 0x12;
/// Reset into the UF2 bootloader.
pub const CMD_RESET_INTO_BOOTLOADER: u8 = 0x13;
/// Read the settings record.
pub const CMD_READ_SETTINGS: u8 = 0x18;
/// Write the settings record.
pub const CMD_WRITE_SETTINGS: u8 = 0x19;
/// Set an oscillator frequency.
pub const CMD_SET_FREQ: u8 = 0x20;

// ============================================================================
// Argument values
// ============================================================================

/// MONITOR payload that starts telemetry streaming.
pub const MONITOR_ENABLE: u8 = 1;
/// MONITOR payload that stops telemetry streaming.
pub const MONITOR_DISABLE: u8 = 0;

// ============================================================================
// Scales and sizes
// ============================================================================

/// Scale of the 16.16 fixed-point format.
pub const FIX16_ONE: f64 = 65536.0;
/// Scale of the ADC gain error value (1.0 == 2048).
pub const ADC_GAIN_SCALE: f64 = 2048.0;
/// Size of an ADC reading in bytes.
pub const ADC_READING_SIZE: usize = 2;
/// Number of ADC channels the module exposes.
pub const ADC_CHANNEL_COUNT: usize = 9;
/// Maximum number of entries in the ramp look-up table.
pub const MAX_LUT_ENTRIES: usize = 256;

// ============================================================================
// Defaults
// ============================================================================

/// Default number of readings averaged by `read_adc_average`.
pub const DEFAULT_ADC_SAMPLES: usize = 10;
/// Default time to wait for a response frame.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1000);
