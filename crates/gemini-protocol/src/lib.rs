//! Gemini SysEx Protocol
//!
//! This crate implements the host side of the MIDI System Exclusive command
//! protocol spoken by the Gemini oscillator module's firmware. Every message
//! is a SysEx message carrying a vendor marker, a one-byte command code and a
//! command-specific payload.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → firmware): one frame per operation. Payloads that
//!   carry arbitrary 8-bit data are teeth-encoded; multi-byte integers are
//!   big-endian, frequencies are 16.16 fixed point.
//! - **Responses** (firmware → host): identification, ADC readings, the
//!   settings record, and acknowledgements for NVM writes.
//! - **Monitor updates** (firmware → host): unsolicited telemetry frames sent
//!   while monitoring is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_protocol::{AdcChannel, Gemini, GeminiConfig, Oscillator};
//!
//! let mut gem = Gemini::<MyMidiTransport>::open(&GeminiConfig::default())?;
//! println!("firmware: {}", gem.get_firmware_version()?);
//!
//! gem.enter_calibration_mode()?;
//! gem.set_frequency(Oscillator::Castor, 440.0)?;
//! let cv = gem.read_adc_average(AdcChannel::CvA, 10)?;
//! ```

mod commands;
mod config;
mod constants;
mod device;
mod error;
mod fix16;
mod frame;
mod ramp;
mod record;
mod responses;
mod transport;
mod types;

pub use commands::*;
pub use config::*;
pub use constants::*;
pub use device::*;
pub use error::*;
pub use fix16::*;
pub use frame::*;
pub use ramp::*;
pub use record::*;
pub use responses::*;
pub use transport::*;
pub use types::*;
