//! Device handle.
//!
//! [`Gemini`] owns one transport connected to one module and exposes an
//! operation per firmware capability. Every operation is synchronous: it
//! sends one frame and, for commands the firmware answers, blocks until the
//! answer arrives or the response timeout passes. The protocol has no
//! sequence numbers, so only one request may be in flight; `&mut self`
//! enforces that for a single handle.

use crate::commands::{adc_gain_from_real, Command};
use crate::config::GeminiConfig;
use crate::error::{ProtocolError, ProtocolResult};
use crate::frame::{PayloadEncoding, SysExFrame};
use crate::ramp::RampTable;
use crate::record::Record;
use crate::responses::Response;
use crate::transport::{Connect, Transport};
use crate::types::*;
use log::{debug, trace, warn};
use std::time::Duration;

/// A connection to one Gemini module.
#[derive(Debug)]
pub struct Gemini<T: Transport> {
    transport: T,
    timeout: Duration,
    adc_samples: usize,
    firmware_version: Option<String>,
    serial_number: Option<String>,
    monitor_state: MonitorState,
}

impl<T: Transport> Gemini<T> {
    /// Wrap a transport using default settings.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &GeminiConfig::default())
    }

    /// Wrap a transport using the timeout and sample count from `config`.
    pub fn with_config(transport: T, config: &GeminiConfig) -> Self {
        Gemini {
            transport,
            timeout: config.response_timeout(),
            adc_samples: config.adc_samples,
            firmware_version: None,
            serial_number: None,
            monitor_state: MonitorState::Disabled,
        }
    }

    /// Open the module's MIDI port by the name in `config`.
    pub fn open(config: &GeminiConfig) -> ProtocolResult<Self>
    where
        T: Connect,
    {
        debug!("Opening MIDI port matching {:?}", config.port_name);
        let transport = T::connect(&config.port_name)?;
        Ok(Self::with_config(transport, config))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn response_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Firmware version from the last `get_firmware_version`, if any.
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Serial number from the last `get_serial_number`, if any.
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Monitor state as last set through this handle.
    pub fn monitor_state(&self) -> MonitorState {
        self.monitor_state
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn send(&mut self, command: &Command) -> ProtocolResult<()> {
        let message = command.encode();
        debug!("Sending {}", command.sysex_command());
        trace!("TX {}", hex::encode(&message));
        self.transport.send_sysex(&message)?;
        Ok(())
    }

    fn wait_for_message(&mut self, command: SysExCommand) -> ProtocolResult<Vec<u8>> {
        match self.transport.receive_sysex(self.timeout)? {
            Some(message) => {
                trace!("RX {}", hex::encode(&message));
                Ok(message)
            }
            None => Err(ProtocolError::NoResponse {
                command,
                timeout: self.timeout,
            }),
        }
    }

    fn request(&mut self, command: &Command) -> ProtocolResult<Response> {
        self.send(command)?;
        let sysex_command = command.sysex_command();
        let message = self.wait_for_message(sysex_command)?;
        Response::decode(sysex_command, &message)
    }

    // ========================================================================
    // Identification
    // ========================================================================

    /// Ask the firmware for its build id.
    pub fn get_firmware_version(&mut self) -> ProtocolResult<String> {
        match self.request(&Command::Hello)? {
            Response::FirmwareVersion(version) => {
                debug!("Firmware version: {}", version);
                self.firmware_version = Some(version.clone());
                Ok(version)
            }
            other => Err(unexpected(SysExCommand::Hello, other)),
        }
    }

    /// Ask the firmware for the MCU serial number, as lowercase hex.
    pub fn get_serial_number(&mut self) -> ProtocolResult<String> {
        match self.request(&Command::GetSerialNumber)? {
            Response::SerialNumber(serial) => {
                debug!("Serial number: {}", serial);
                self.serial_number = Some(serial.clone());
                Ok(serial)
            }
            other => Err(unexpected(SysExCommand::GetSerialNumber, other)),
        }
    }

    /// Whether the firmware build id contains `release_tag`.
    pub fn firmware_matches_release(&mut self, release_tag: &str) -> ProtocolResult<bool> {
        let version = self.get_firmware_version()?;
        Ok(version.contains(release_tag))
    }

    // ========================================================================
    // Calibration
    // ========================================================================

    pub fn enter_calibration_mode(&mut self) -> ProtocolResult<()> {
        self.send(&Command::EnterCalibration)
    }

    /// Take one reading from an ADC channel.
    pub fn read_adc(&mut self, channel: AdcChannel) -> ProtocolResult<u16> {
        match self.request(&Command::ReadAdc { channel })? {
            Response::AdcReading(value) => Ok(value),
            other => Err(unexpected(SysExCommand::ReadAdc, other)),
        }
    }

    /// Take `samples` readings from an ADC channel and return their mean.
    pub fn read_adc_average(&mut self, channel: AdcChannel, samples: usize) -> ProtocolResult<f64> {
        if samples == 0 {
            return Err(ProtocolError::ValueOutOfRange {
                name: "sample count",
                value: 0.0,
            });
        }

        let mut total: u64 = 0;
        for _ in 0..samples {
            total += u64::from(self.read_adc(channel)?);
        }

        Ok(total as f64 / samples as f64)
    }

    /// [`read_adc_average`](Self::read_adc_average) with the configured sample count.
    pub fn read_adc_average_default(&mut self, channel: AdcChannel) -> ProtocolResult<f64> {
        self.read_adc_average(channel, self.adc_samples)
    }

    /// Drive the four DAC outputs.
    pub fn set_dac(&mut self, a: u16, b: u16, c: u16, d: u16) -> ProtocolResult<()> {
        self.send(&Command::SetDac {
            codes: [a, b, c, d],
        })
    }

    /// Set an oscillator's frequency in hertz.
    pub fn set_frequency(&mut self, oscillator: Oscillator, frequency: f64) -> ProtocolResult<()> {
        if !frequency.is_finite() {
            return Err(ProtocolError::ValueOutOfRange {
                name: "frequency",
                value: frequency,
            });
        }
        self.send(&Command::SetFrequency {
            oscillator,
            frequency,
        })
    }

    /// Write the raw ADC gain error (gain × 2048).
    pub fn set_adc_gain_error_int(&mut self, gain: u16) -> ProtocolResult<()> {
        self.send(&Command::WriteAdcGain { gain })
    }

    /// Write the ADC gain error as a real factor.
    pub fn set_adc_gain_error(&mut self, gain: f64) -> ProtocolResult<()> {
        let gain = adc_gain_from_real(gain)?;
        self.set_adc_gain_error_int(gain)
    }

    pub fn set_adc_offset_error(&mut self, offset: i16) -> ProtocolResult<()> {
        self.send(&Command::WriteAdcOffset { offset })
    }

    pub fn enable_adc_error_correction(&mut self) -> ProtocolResult<()> {
        self.send(&Command::SetAdcCorrection { enabled: true })
    }

    pub fn disable_adc_error_correction(&mut self) -> ProtocolResult<()> {
        self.send(&Command::SetAdcCorrection { enabled: false })
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Restore the firmware's default settings.
    pub fn reset_settings(&mut self) -> ProtocolResult<()> {
        self.send(&Command::ResetSettings)
    }

    /// Read and unpack the settings record.
    pub fn read_settings<S: Record>(&mut self) -> ProtocolResult<S> {
        match self.request(&Command::ReadSettings)? {
            Response::Settings(data) => Ok(S::unpack(&data)?),
            other => Err(unexpected(SysExCommand::ReadSettings, other)),
        }
    }

    /// Pack and write the settings record, waiting for the acknowledgement.
    pub fn save_settings<S: Record>(&mut self, settings: &S) -> ProtocolResult<()> {
        self.request(&Command::WriteSettings {
            data: settings.pack(),
        })?;
        Ok(())
    }

    // ========================================================================
    // Ramp look-up table
    // ========================================================================

    /// Write one LUT entry, waiting for the acknowledgement.
    pub fn write_lut_entry(&mut self, entry: LutEntry) -> ProtocolResult<()> {
        self.request(&Command::WriteLutEntry(entry))?;
        Ok(())
    }

    /// Commit the LUT to NVM.
    pub fn write_lut(&mut self) -> ProtocolResult<()> {
        self.send(&Command::WriteLut)
    }

    pub fn erase_lut(&mut self) -> ProtocolResult<()> {
        self.send(&Command::EraseLut)
    }

    /// Upload every row of `table` and commit it. Returns the table checksum.
    pub fn upload_ramp_table(&mut self, table: &RampTable) -> ProtocolResult<u16> {
        let entries = table.entries()?;
        for entry in entries {
            self.write_lut_entry(entry)?;
        }
        self.write_lut()?;

        let checksum = table.checksum();
        debug!("Uploaded {} ramp entries, checksum {:04x}", table.len(), checksum);
        Ok(checksum)
    }

    // ========================================================================
    // Monitor
    // ========================================================================

    /// Start streaming monitor updates.
    pub fn enable_monitor(&mut self) -> ProtocolResult<()> {
        self.send(&Command::Monitor { enabled: true })?;
        self.monitor_state = MonitorState::Enabled;
        Ok(())
    }

    /// Stop streaming monitor updates.
    pub fn disable_monitor(&mut self) -> ProtocolResult<()> {
        self.send(&Command::Monitor { enabled: false })?;
        self.monitor_state = MonitorState::Disabled;
        Ok(())
    }

    /// Wait for and decode the next monitor update.
    ///
    /// If anything goes wrong (timeout, bad frame, bad payload) monitoring is
    /// disabled before the error is returned, so the firmware never keeps
    /// streaming into a host that has stopped listening.
    pub fn monitor<M: Record>(&mut self) -> ProtocolResult<M> {
        let mut guard = DisableMonitorOnDrop {
            gemini: self,
            armed: true,
        };
        let update = guard.gemini.receive_monitor_update()?;
        guard.armed = false;
        Ok(update)
    }

    fn receive_monitor_update<M: Record>(&mut self) -> ProtocolResult<M> {
        let message = self.wait_for_message(SysExCommand::Monitor)?;
        let frame = SysExFrame::decode(&message, PayloadEncoding::Teeth)?;
        if frame.command != SysExCommand::Monitor {
            warn!("Expected a monitor update, got {}", frame.command);
        }
        Ok(M::unpack(&frame.payload)?)
    }

    // ========================================================================
    // Resets
    // ========================================================================

    pub fn soft_reset(&mut self) -> ProtocolResult<()> {
        self.send(&Command::SoftReset)
    }

    /// Restart into the bootloader for a firmware update.
    pub fn reset_into_bootloader(&mut self) -> ProtocolResult<()> {
        self.send(&Command::ResetIntoBootloader)
    }
}

/// Disables monitoring when dropped unless disarmed.
struct DisableMonitorOnDrop<'a, T: Transport> {
    gemini: &'a mut Gemini<T>,
    armed: bool,
}

impl<T: Transport> Drop for DisableMonitorOnDrop<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Best effort; the decode error is what the caller needs to see.
        if let Err(err) = self.gemini.disable_monitor() {
            warn!("Failed to disable monitor after decode error: {}", err);
        }
    }
}

fn unexpected(command: SysExCommand, response: Response) -> ProtocolError {
    ProtocolError::MalformedFrame(format!(
        "unexpected response to {}: {:?}",
        command, response
    ))
}
