//! Status report decoding and the telemetry poll.
//!
//! A poll is one round trip: `GET_ALL_VALUES` out, a 24-byte report back.
//! The report layout:
//!
//! | byte  | content                                                      |
//! |-------|--------------------------------------------------------------|
//! | 0     | packet type, always `0x82`                                   |
//! | 1     | mode: bits 0-1 run mode, 2-4 voltage config, 5-7 time config |
//! | 2     | state code (7 = good, 18 = shutdown imminent)                |
//! | 3/4/5 | input / ignition / output voltage codes                      |
//! | 6     | flags: bit 2 power switch, 3 output enable, 4 aux Vin enable |
//! | 7-22  | unused                                                       |
//! | 23    | firmware version, 3 bits major / 5 bits minor                |

use std::fmt;

use log::warn;

use crate::codec;
use crate::device::DcdcDevice;
use crate::error::DcdcError;
use crate::protocol::*;
use crate::usb::UsbHandle;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A value read from the device that may be a known enum variant or an
/// unrecognized raw byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadValue<T> {
    /// A recognized, strongly-typed value.
    Known(T),
    /// An unrecognized byte from the device.
    Unknown(u8),
}

impl<T: fmt::Display> fmt::Display for ReadValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "{}", v),
            Self::Unknown(b) => write!(f, "Unknown ({})", b),
        }
    }
}

/// Converter state from byte 2 of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Running normally.
    Good,
    /// About a minute before the converter switches itself off.
    ImminentShutdown,
}

impl PowerState {
    /// The state code on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Good => STATE_GOOD,
            Self::ImminentShutdown => STATE_IMMINENT_SHUTDOWN,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "Good ({})", STATE_GOOD),
            Self::ImminentShutdown => write!(f, "Imminent shutdown ({})", STATE_IMMINENT_SHUTDOWN),
        }
    }
}

fn decode_state(v: u8) -> ReadValue<PowerState> {
    match v {
        STATE_GOOD => ReadValue::Known(PowerState::Good),
        STATE_IMMINENT_SHUTDOWN => ReadValue::Known(PowerState::ImminentShutdown),
        _ => ReadValue::Unknown(v),
    }
}

/// Firmware version from byte 23.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    fn from_byte(v: u8) -> Self {
        Self { major: v >> FIRMWARE_MAJOR_SHIFT, minor: v & FIRMWARE_MINOR_MASK }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A validated 24-byte status report.
///
/// Only [`StatusReport::decode`] constructs one, so every instance starts
/// with the all-values packet type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    raw: [u8; STATUS_REPORT_LEN],
}

impl StatusReport {
    /// Validate a received frame.
    ///
    /// Fails with [`DcdcError::ShortRead`] on fewer than 24 bytes and with
    /// [`DcdcError::UnexpectedPacketType`] when byte 0 is not `0x82`. Bytes
    /// past the 24th are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DcdcError> {
        let raw: [u8; STATUS_REPORT_LEN] = data
            .get(..STATUS_REPORT_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(DcdcError::ShortRead { expected: STATUS_REPORT_LEN, got: data.len() })?;

        if raw[OFFSET_PACKET_TYPE] != RECV_ALL_VALUES {
            return Err(DcdcError::UnexpectedPacketType { got: raw[OFFSET_PACKET_TYPE] });
        }

        Ok(Self { raw })
    }

    pub fn as_bytes(&self) -> &[u8; STATUS_REPORT_LEN] {
        &self.raw
    }

    pub fn mode_byte(&self) -> u8 {
        self.raw[OFFSET_MODE]
    }

    pub fn state_code(&self) -> u8 {
        self.raw[OFFSET_STATE]
    }

    pub fn input_voltage_raw(&self) -> u8 {
        self.raw[OFFSET_INPUT_VOLTAGE]
    }

    pub fn ignition_voltage_raw(&self) -> u8 {
        self.raw[OFFSET_IGNITION_VOLTAGE]
    }

    pub fn output_voltage_raw(&self) -> u8 {
        self.raw[OFFSET_OUTPUT_VOLTAGE]
    }

    pub fn flags(&self) -> u8 {
        self.raw[OFFSET_FLAGS]
    }

    pub fn firmware_byte(&self) -> u8 {
        self.raw[OFFSET_FIRMWARE]
    }

    /// Convert the raw fields to physical units.
    pub fn telemetry(&self, cal: &Calibration) -> Telemetry {
        let mode = self.mode_byte();
        let flags = self.flags();

        Telemetry {
            mode: mode & MODE_RUN_MASK,
            voltage_config: (mode >> MODE_VOLTAGE_CONFIG_SHIFT) & MODE_CONFIG_MASK,
            time_config: (mode >> MODE_TIME_CONFIG_SHIFT) & MODE_CONFIG_MASK,
            state: decode_state(self.state_code()),
            input_voltage: codec::decode_input_voltage(cal, self.input_voltage_raw()),
            ignition_voltage: codec::decode_ignition_voltage(cal, self.ignition_voltage_raw()),
            output_voltage: codec::decode_output_voltage(cal, self.output_voltage_raw()),
            power_switch: flags & FLAG_POWER_SWITCH != 0,
            output_enable: flags & FLAG_OUTPUT_ENABLE != 0,
            aux_enable: flags & FLAG_AUX_VIN_ENABLE != 0,
            firmware: FirmwareVersion::from_byte(self.firmware_byte()),
        }
    }
}

/// One telemetry snapshot, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    /// Run mode (mode bits 0-1).
    pub mode: u8,
    /// Time configuration (mode bits 5-7).
    pub time_config: u8,
    /// Voltage configuration (mode bits 2-4).
    pub voltage_config: u8,
    pub state: ReadValue<PowerState>,
    /// Volts.
    pub input_voltage: f64,
    /// Volts.
    pub ignition_voltage: f64,
    /// Volts.
    pub output_voltage: f64,
    pub power_switch: bool,
    pub output_enable: bool,
    pub aux_enable: bool,
    pub firmware: FirmwareVersion,
}

fn on_off(v: bool) -> &'static str {
    if v { "On" } else { "Off" }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Time config: {}", self.time_config)?;
        writeln!(f, "Voltage config: {}", self.voltage_config)?;
        writeln!(f, "State: {}", self.state)?;
        writeln!(f, "Input voltage: {:.3} V", self.input_voltage)?;
        writeln!(f, "Ignition voltage: {:.3} V", self.ignition_voltage)?;
        writeln!(f, "Output voltage: {:.3} V", self.output_voltage)?;
        writeln!(f, "Power switch: {}", on_off(self.power_switch))?;
        writeln!(f, "Output enable: {}", on_off(self.output_enable))?;
        writeln!(f, "Aux V in enable: {}", on_off(self.aux_enable))?;
        writeln!(f, "Firmware version: {}", self.firmware)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DcdcDevice polling methods
// ---------------------------------------------------------------------------

impl<H: UsbHandle> DcdcDevice<H> {
    /// Request, receive, and validate one status report.
    ///
    /// A failed request is only logged: the device may still answer, for
    /// example with a report it queued earlier. A failed or short receive
    /// fails with [`DcdcError::ReadFailed`]; a frame of the wrong type with
    /// [`DcdcError::UnexpectedPacketType`]. Either way the session stays
    /// usable for the next poll.
    pub fn read_status_report(&self) -> Result<StatusReport, DcdcError> {
        if let Err(e) = self.write(&codec::encode_get_all_values()) {
            warn!("get_all_values failed: {}", e);
        }

        let raw = self
            .read_report(READ_TIMEOUT)
            .map_err(|e| DcdcError::ReadFailed(Box::new(e)))?;

        StatusReport::decode(&raw)
    }

    /// Poll the converter once and return the decoded telemetry.
    pub fn poll_telemetry(&self) -> Result<Telemetry, DcdcError> {
        let report = self.read_status_report()?;
        if self.debug {
            log::debug!("status report: {:02x?}", report.as_bytes());
        }
        Ok(report.telemetry(&DCDC_USB))
    }

    /// Poll the converter once and return only the input voltage.
    pub fn read_input_voltage(&self) -> Result<f64, DcdcError> {
        let report = self.read_status_report()?;
        Ok(codec::decode_input_voltage(&DCDC_USB, report.input_voltage_raw()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
