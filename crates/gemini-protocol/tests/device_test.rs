//! Integration tests for the device handle against an in-memory transport.
//!
//! Replies are queued ahead of time the way the firmware would send them, and
//! the frames the handle sends are checked byte for byte.

use gemini_protocol::*;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

/// A complete SysEx message as the firmware would send it.
fn device_message(command: SysExCommand, payload: &[u8], encoding: PayloadEncoding) -> Vec<u8> {
    SysExFrame::to_message(&SysExFrame::new(command, payload.to_vec()).encode(encoding))
}

fn adc_reply(value: u16) -> Vec<u8> {
    device_message(SysExCommand::ReadAdc, &value.to_be_bytes(), PayloadEncoding::Teeth)
}

fn ack(command: SysExCommand) -> Vec<u8> {
    device_message(command, &[], PayloadEncoding::Raw)
}

fn gemini_with_replies(replies: Vec<Vec<u8>>) -> Gemini<MemoryTransport> {
    let mut transport = MemoryTransport::new();
    for reply in replies {
        transport.push_reply(reply);
    }
    Gemini::new(transport)
}

/// Frames sent so far, decoded with the given payload encoding.
fn sent_frames(gem: &Gemini<MemoryTransport>, encoding: PayloadEncoding) -> Vec<SysExFrame> {
    gem.transport()
        .sent()
        .iter()
        .map(|msg| SysExFrame::decode(msg, encoding).expect("sent frame should decode"))
        .collect()
}

fn disable_monitor_count(gem: &Gemini<MemoryTransport>) -> usize {
    let disable = Command::Monitor { enabled: false }.encode();
    gem.transport()
        .sent()
        .iter()
        .filter(|msg| **msg == disable)
        .count()
}

#[derive(Debug, Clone, PartialEq)]
struct TestSettings {
    castor_offset: i32,
    pollux_offset: i32,
    chorus_max: u16,
}

impl Record for TestSettings {
    fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(10);
        buf.extend_from_slice(&self.castor_offset.to_be_bytes());
        buf.extend_from_slice(&self.pollux_offset.to_be_bytes());
        buf.extend_from_slice(&self.chorus_max.to_be_bytes());
        buf
    }

    fn unpack(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() != 10 {
            return Err(RecordError::WrongSize {
                expected: 10,
                actual: data.len(),
            });
        }
        Ok(TestSettings {
            castor_offset: i32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            pollux_offset: i32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            chorus_max: u16::from_be_bytes([data[8], data[9]]),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TestMonitorUpdate {
    castor_pitch_cv: u16,
    pollux_pitch_cv: u16,
}

impl Record for TestMonitorUpdate {
    fn pack(&self) -> Vec<u8> {
        let mut buf = self.castor_pitch_cv.to_be_bytes().to_vec();
        buf.extend_from_slice(&self.pollux_pitch_cv.to_be_bytes());
        buf
    }

    fn unpack(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() != 4 {
            return Err(RecordError::WrongSize {
                expected: 4,
                actual: data.len(),
            });
        }
        Ok(TestMonitorUpdate {
            castor_pitch_cv: u16::from_be_bytes([data[0], data[1]]),
            pollux_pitch_cv: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

/// Monitor record whose unpack panics.
#[derive(Debug)]
struct PanickingUpdate;

impl Record for PanickingUpdate {
    fn pack(&self) -> Vec<u8> {
        Vec::new()
    }

    fn unpack(_data: &[u8]) -> Result<Self, RecordError> {
        panic!("unpack blew up");
    }
}

// ============================================================================
// Identification
// ============================================================================

#[test]
fn test_firmware_version_and_serial() {
    let mut gem = gemini_with_replies(vec![
        device_message(SysExCommand::Hello, b"v1.3.0-12-gabcdef", PayloadEncoding::Raw),
        device_message(
            SysExCommand::GetSerialNumber,
            &[0x3C, 0x9F, 0x00, 0xFF, 0x12, 0x34, 0x56, 0x78],
            PayloadEncoding::Teeth,
        ),
    ]);

    assert_eq!(gem.get_firmware_version().unwrap(), "v1.3.0-12-gabcdef");
    assert_eq!(gem.get_serial_number().unwrap(), "3c9f00ff12345678");
    assert_eq!(gem.firmware_version(), Some("v1.3.0-12-gabcdef"));
    assert_eq!(gem.serial_number(), Some("3c9f00ff12345678"));

    let sent = gem.transport().sent();
    assert_eq!(sent[0], vec![0x77, 0x01]);
    assert_eq!(sent[1], vec![0x77, 0x0F]);
}

#[test]
fn test_firmware_matches_release() {
    let mut gem = gemini_with_replies(vec![
        device_message(SysExCommand::Hello, b"v2022.3.1-dirty", PayloadEncoding::Raw),
        device_message(SysExCommand::Hello, b"v2022.3.1-dirty", PayloadEncoding::Raw),
    ]);

    assert!(gem.firmware_matches_release("v2022.3.1").unwrap());
    assert!(!gem.firmware_matches_release("v2023.1.0").unwrap());
}

#[test]
fn test_response_timeout_reported() {
    let mut gem = gemini_with_replies(vec![]);
    gem.set_response_timeout(Duration::from_millis(20));

    match gem.get_firmware_version() {
        Err(ProtocolError::NoResponse { command, timeout }) => {
            assert_eq!(command, SysExCommand::Hello);
            assert_eq!(timeout, Duration::from_millis(20));
        }
        other => panic!("expected NoResponse, got {:?}", other),
    }
    assert_eq!(gem.firmware_version(), None);
}

// ============================================================================
// ADC
// ============================================================================

#[test]
fn test_read_adc() {
    let mut gem = gemini_with_replies(vec![adc_reply(0x0ABC)]);
    assert_eq!(gem.read_adc(AdcChannel::ChorusPot).unwrap(), 0x0ABC);
    assert_eq!(gem.transport().sent()[0], vec![0x77, 0x04, 0x04]);
}

#[test]
fn test_read_adc_average() {
    let mut gem = gemini_with_replies(vec![adc_reply(10), adc_reply(20), adc_reply(30), adc_reply(40)]);

    let mean = gem.read_adc_average(AdcChannel::CvB, 4).unwrap();
    assert_eq!(mean, 25.0);

    let sent = gem.transport().sent();
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|msg| *msg == vec![0x77, 0x04, 0x08]));
}

#[test]
fn test_read_adc_average_is_exact_mean() {
    let mut gem = gemini_with_replies(vec![adc_reply(1), adc_reply(2), adc_reply(2)]);
    let mean = gem.read_adc_average(AdcChannel::DutyA, 3).unwrap();
    approx::assert_abs_diff_eq!(mean, 5.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_read_adc_average_default_uses_config() {
    let config = GeminiConfig {
        adc_samples: 2,
        ..GeminiConfig::default()
    };
    let mut transport = MemoryTransport::new();
    transport.push_reply(adc_reply(4095));
    transport.push_reply(adc_reply(4093));
    let mut gem = Gemini::with_config(transport, &config);

    assert_eq!(gem.read_adc_average_default(AdcChannel::CvA).unwrap(), 4094.0);
    assert_eq!(gem.transport().pending_replies(), 0);
}

#[test]
fn test_read_adc_average_propagates_timeout() {
    let mut gem = gemini_with_replies(vec![adc_reply(10)]);
    let result = gem.read_adc_average(AdcChannel::CvA, 2);
    assert!(matches!(result, Err(ProtocolError::NoResponse { .. })));
}

#[test]
fn test_read_adc_wrong_length() {
    let mut gem = gemini_with_replies(vec![device_message(
        SysExCommand::ReadAdc,
        &[0x01, 0x02, 0x03],
        PayloadEncoding::Teeth,
    )]);
    assert!(matches!(
        gem.read_adc(AdcChannel::CvA),
        Err(ProtocolError::MalformedFrame(_))
    ));
}

#[test]
fn test_read_adc_wrong_marker() {
    let mut gem = gemini_with_replies(vec![vec![0xF0, 0x7E, 0x04, 0x00, 0x01, 0x02, 0xF7]]);
    assert!(matches!(
        gem.read_adc(AdcChannel::CvA),
        Err(ProtocolError::MalformedFrame(_))
    ));
}

#[test]
fn test_unsupported_channel_index() {
    assert!(matches!(
        AdcChannel::try_from(9),
        Err(ProtocolError::UnsupportedChannel(9))
    ));
    assert!(matches!(
        AdcChannel::try_from(0xFF),
        Err(ProtocolError::UnsupportedChannel(0xFF))
    ));
}

// ============================================================================
// Calibration outputs
// ============================================================================

#[test]
fn test_set_dac_is_teeth_encoded() {
    let mut gem = gemini_with_replies(vec![]);
    gem.set_dac(4095, 2048, 0, 0x8001).unwrap();

    let frames = sent_frames(&gem, PayloadEncoding::Teeth);
    assert_eq!(
        frames[0],
        SysExFrame::new(
            SysExCommand::SetDac,
            vec![0x0F, 0xFF, 0x08, 0x00, 0x00, 0x00, 0x80, 0x01]
        )
    );
    // Every transmitted payload byte must be 7-bit.
    assert!(gem.transport().sent()[0].iter().all(|b| b & 0x80 == 0));
}

#[test]
fn test_set_frequency() {
    let mut gem = gemini_with_replies(vec![]);
    gem.set_frequency(Oscillator::Castor, 0.5).unwrap();
    gem.set_frequency(Oscillator::Pollux, -0.5).unwrap();

    let frames = sent_frames(&gem, PayloadEncoding::Teeth);
    assert_eq!(frames[0].payload, vec![0x00, 0x00, 0x00, 0x80, 0x00]);
    assert_eq!(frames[1].payload, vec![0x01, 0xFF, 0xFF, 0x80, 0x00]);
}

#[test]
fn test_set_frequency_rejects_non_finite() {
    let mut gem = gemini_with_replies(vec![]);
    for frequency in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            gem.set_frequency(Oscillator::Castor, frequency),
            Err(ProtocolError::ValueOutOfRange { name: "frequency", .. })
        ));
    }
    assert!(gem.transport().sent().is_empty());
}

#[test]
fn test_adc_gain_real_matches_int() {
    let mut real = gemini_with_replies(vec![]);
    real.set_adc_gain_error(1.0).unwrap();

    let mut int = gemini_with_replies(vec![]);
    int.set_adc_gain_error_int(2048).unwrap();

    assert_eq!(real.transport().sent(), int.transport().sent());
}

#[test]
fn test_adc_gain_out_of_range_sends_nothing() {
    let mut gem = gemini_with_replies(vec![]);
    assert!(matches!(
        gem.set_adc_gain_error(-1.0),
        Err(ProtocolError::ValueOutOfRange { .. })
    ));
    assert!(gem.transport().sent().is_empty());
}

#[test]
fn test_adc_offset_and_correction() {
    let mut gem = gemini_with_replies(vec![]);
    gem.set_adc_offset_error(-7).unwrap();
    gem.disable_adc_error_correction().unwrap();
    gem.enable_adc_error_correction().unwrap();

    let sent = gem.transport().sent();
    let offset = SysExFrame::decode(&sent[0], PayloadEncoding::Teeth).unwrap();
    assert_eq!(offset.command, SysExCommand::WriteAdcOffset);
    assert_eq!(offset.payload, (-7i16).to_be_bytes().to_vec());
    assert_eq!(sent[1], vec![0x77, 0x0D]);
    assert_eq!(sent[2], vec![0x77, 0x0E]);
}

#[test]
fn test_simple_commands() {
    let mut gem = gemini_with_replies(vec![]);
    gem.enter_calibration_mode().unwrap();
    gem.reset_settings().unwrap();
    gem.write_lut().unwrap();
    gem.erase_lut().unwrap();
    gem.soft_reset().unwrap();
    gem.reset_into_bootloader().unwrap();

    assert_eq!(
        gem.transport().sent(),
        &[
            vec![0x77u8, 0x12],
            vec![0x77, 0x07],
            vec![0x77, 0x0B],
            vec![0x77, 0x0C],
            vec![0x77, 0x11],
            vec![0x77, 0x13],
        ]
    );
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_settings_round_trip() {
    let settings = TestSettings {
        castor_offset: -123_456,
        pollux_offset: 0x7FFF_FFFF,
        chorus_max: 0x8080,
    };

    let mut gem = gemini_with_replies(vec![
        ack(SysExCommand::WriteSettings),
        device_message(SysExCommand::ReadSettings, &settings.pack(), PayloadEncoding::Teeth),
    ]);

    gem.save_settings(&settings).unwrap();
    let read_back: TestSettings = gem.read_settings().unwrap();
    assert_eq!(read_back, settings);

    // The packed bytes went out unmodified under the teeth encoding.
    let written = SysExFrame::decode(&gem.transport().sent()[0], PayloadEncoding::Teeth).unwrap();
    assert_eq!(written.command, SysExCommand::WriteSettings);
    assert_eq!(written.payload, settings.pack());
}

#[test]
fn test_save_settings_waits_for_ack() {
    let settings = RawRecord(vec![1, 2, 3]);
    let mut gem = gemini_with_replies(vec![]);
    assert!(matches!(
        gem.save_settings(&settings),
        Err(ProtocolError::NoResponse {
            command: SysExCommand::WriteSettings,
            ..
        })
    ));
}

#[test]
fn test_read_settings_unpack_failure() {
    let mut gem = gemini_with_replies(vec![device_message(
        SysExCommand::ReadSettings,
        &[0x00; 3],
        PayloadEncoding::Teeth,
    )]);
    let result: ProtocolResult<TestSettings> = gem.read_settings();
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
}

// ============================================================================
// Ramp table
// ============================================================================

#[test]
fn test_write_lut_entry() {
    let mut gem = gemini_with_replies(vec![ack(SysExCommand::WriteLutEntry)]);
    let entry = LutEntry {
        index: 7,
        period: 96_000,
        castor: 1024,
        pollux: 1030,
    };
    gem.write_lut_entry(entry).unwrap();

    let frame = SysExFrame::decode(&gem.transport().sent()[0], PayloadEncoding::Teeth).unwrap();
    assert_eq!(frame.command, SysExCommand::WriteLutEntry);
    assert_eq!(frame.payload, vec![7, 0x00, 0x01, 0x77, 0x00, 0x04, 0x00, 0x04, 0x06]);
}

#[test]
fn test_upload_ramp_table() {
    let mut table = RampTable::new();
    table.push(120_000, 300, 310);
    table.push(60_000, 900, 880);
    table.push(30_000, 2400, 2390);

    let mut gem = gemini_with_replies(vec![
        ack(SysExCommand::WriteLutEntry),
        ack(SysExCommand::WriteLutEntry),
        ack(SysExCommand::WriteLutEntry),
    ]);

    let checksum = gem.upload_ramp_table(&table).unwrap();
    assert_eq!(checksum, 300 ^ 900 ^ 2400);

    let sent = gem.transport().sent();
    assert_eq!(sent.len(), 4);
    for (i, msg) in sent[..3].iter().enumerate() {
        let frame = SysExFrame::decode(msg, PayloadEncoding::Teeth).unwrap();
        assert_eq!(frame.command, SysExCommand::WriteLutEntry);
        assert_eq!(frame.payload[0], i as u8);
    }
    assert_eq!(sent[3], vec![0x77, 0x0B]);
}

#[test]
fn test_upload_ramp_table_stops_on_missing_ack() {
    let mut table = RampTable::new();
    table.push(1, 1, 1);
    table.push(2, 2, 2);

    let mut gem = gemini_with_replies(vec![ack(SysExCommand::WriteLutEntry)]);
    assert!(matches!(
        gem.upload_ramp_table(&table),
        Err(ProtocolError::NoResponse { .. })
    ));
    // Two entries attempted, no commit.
    assert_eq!(gem.transport().sent().len(), 2);
}

// ============================================================================
// Monitor
// ============================================================================

#[test]
fn test_monitor_decodes_update() {
    let update = TestMonitorUpdate {
        castor_pitch_cv: 0x8123,
        pollux_pitch_cv: 0x0042,
    };
    let mut gem = gemini_with_replies(vec![device_message(
        SysExCommand::Monitor,
        &update.pack(),
        PayloadEncoding::Teeth,
    )]);

    gem.enable_monitor().unwrap();
    let received: TestMonitorUpdate = gem.monitor().unwrap();
    assert_eq!(received, update);
    assert_eq!(gem.monitor_state(), MonitorState::Enabled);
    assert_eq!(disable_monitor_count(&gem), 0);
}

#[test]
fn test_monitor_unpack_failure_disables_once() {
    let mut gem = gemini_with_replies(vec![device_message(
        SysExCommand::Monitor,
        &[0x01, 0x02, 0x03],
        PayloadEncoding::Teeth,
    )]);
    gem.enable_monitor().unwrap();

    let result: ProtocolResult<TestMonitorUpdate> = gem.monitor();
    match result {
        Err(ProtocolError::MalformedFrame(msg)) => assert!(msg.contains("expected 4 bytes")),
        other => panic!("expected MalformedFrame, got {:?}", other),
    }
    assert_eq!(disable_monitor_count(&gem), 1);
    assert_eq!(gem.monitor_state(), MonitorState::Disabled);
}

#[test]
fn test_monitor_bad_escape_disables() {
    // Header 0x04 sets the high bit of a second byte the group doesn't carry.
    let mut gem = gemini_with_replies(vec![vec![0xF0, 0x77, 0x10, 0x04, 0x01, 0xF7]]);
    gem.enable_monitor().unwrap();

    let result: ProtocolResult<RawRecord> = gem.monitor();
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    assert_eq!(disable_monitor_count(&gem), 1);
}

#[test]
fn test_monitor_wrong_marker_disables() {
    let mut gem = gemini_with_replies(vec![vec![0xF0, 0x00, 0x10, 0xF7]]);
    let result: ProtocolResult<RawRecord> = gem.monitor();
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    assert_eq!(disable_monitor_count(&gem), 1);
}

#[test]
fn test_monitor_unknown_command_disables() {
    let mut gem = gemini_with_replies(vec![vec![0xF0, 0x77, 0x06, 0x00, 0x01, 0xF7]]);
    gem.enable_monitor().unwrap();

    let result: ProtocolResult<RawRecord> = gem.monitor();
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    assert_eq!(disable_monitor_count(&gem), 1);
}

#[test]
fn test_monitor_panic_still_disables() {
    let mut gem = gemini_with_replies(vec![device_message(
        SysExCommand::Monitor,
        &[0x00],
        PayloadEncoding::Teeth,
    )]);
    gem.enable_monitor().unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: ProtocolResult<PanickingUpdate> = gem.monitor();
    }));
    assert!(result.is_err());
    assert_eq!(disable_monitor_count(&gem), 1);
}

/// Transport whose sends fail once monitoring has been enabled.
#[derive(Default)]
struct FlakyTransport {
    sends: usize,
}

impl Transport for FlakyTransport {
    fn send_sysex(&mut self, _message: &[u8]) -> io::Result<()> {
        self.sends += 1;
        if self.sends > 1 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port closed"));
        }
        Ok(())
    }

    fn receive_sysex(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        Ok(Some(vec![0xF0, 0x77, 0x10, 0x00, 0xF7]))
    }
}

#[test]
fn test_monitor_failed_disable_keeps_original_error() {
    let mut gem = Gemini::new(FlakyTransport::default());
    gem.enable_monitor().unwrap();

    // A lone teeth header is a decode error; the disable then fails too.
    let result: ProtocolResult<RawRecord> = gem.monitor();
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    assert_eq!(gem.transport().sends, 2);
    assert_eq!(gem.monitor_state(), MonitorState::Enabled);
}

// ============================================================================
// Opening by port name
// ============================================================================

struct NamedTransport {
    port_name: String,
}

impl Transport for NamedTransport {
    fn send_sysex(&mut self, _message: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn receive_sysex(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl Connect for NamedTransport {
    fn connect(port_name: &str) -> io::Result<Self> {
        if port_name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such port"));
        }
        Ok(NamedTransport {
            port_name: port_name.to_string(),
        })
    }
}

#[test]
fn test_open_uses_config() {
    let config = GeminiConfig::from_yaml_str("port_name: Gemini II\nresponse_timeout_ms: 75\n").unwrap();
    let gem = Gemini::<NamedTransport>::open(&config).unwrap();
    assert_eq!(gem.transport().port_name, "Gemini II");
    assert_eq!(gem.response_timeout(), Duration::from_millis(75));
}

#[test]
fn test_open_missing_port() {
    let config = GeminiConfig {
        port_name: String::new(),
        ..GeminiConfig::default()
    };
    assert!(matches!(
        Gemini::<NamedTransport>::open(&config),
        Err(ProtocolError::Transport(_))
    ));
}
