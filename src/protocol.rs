//! Protocol constants for the DCDC-USB converter.
//!
//! All magic numbers, packet types, bit masks, and calibration values are
//! defined here so the rest of the codebase references named constants
//! instead of raw hex.

use std::time::Duration;

// ---------------------------------------------------------------------------
// USB device identifiers
// ---------------------------------------------------------------------------

/// Microchip vendor ID (the converter runs on a PIC18 with the stock VID).
pub const VENDOR_ID: u16 = 0x04d8;
/// DCDC-USB product ID.
pub const PRODUCT_ID: u16 = 0xd003;

/// The only interface the device exposes.
pub const INTERFACE: u8 = 0;
/// Configuration selected after reset.
pub const CONFIGURATION: u8 = 1;
/// Alternate setting selected after claim.
pub const ALT_SETTING: u8 = 0;

/// Interrupt OUT endpoint 1 (host-to-device).
pub const ENDPOINT_OUT: u8 = 0x01;
/// Interrupt IN endpoint 1 (device-to-host).
pub const ENDPOINT_IN: u8 = 0x81;

// ---------------------------------------------------------------------------
// Post-claim handshake
// ---------------------------------------------------------------------------

/// bmRequestType for host-to-device class request, interface recipient.
pub const CLASS_REQUEST_TYPE_OUT: u8 = 0x21;
/// bRequest of the zero-length handshake (HID SET_IDLE).
pub const INIT_REQUEST: u8 = 0x0a;

// ---------------------------------------------------------------------------
// Packet types (byte 0 of every interrupt packet)
// ---------------------------------------------------------------------------

/// Request: send me all values.
pub const GET_ALL_VALUES: u8 = 0x81;
/// Response to [`GET_ALL_VALUES`].
pub const RECV_ALL_VALUES: u8 = 0x82;
/// Request: generic command with one value byte.
pub const CMD_OUT: u8 = 0xb1;

/// Length of the `GET_ALL_VALUES` request.
pub const GET_ALL_VALUES_LEN: usize = 2;
/// Length of a `CMD_OUT` request.
pub const CMD_OUT_LEN: usize = 5;
/// Length of the status report returned for `GET_ALL_VALUES`.
pub const STATUS_REPORT_LEN: usize = 24;

// ---------------------------------------------------------------------------
// Command codes (byte 1 of a CMD_OUT packet)
// ---------------------------------------------------------------------------

pub const CMD_SET_AUX_WIN: u8 = 0x01;
pub const CMD_SET_PW_SWITCH: u8 = 0x02;
pub const CMD_SET_OUTPUT: u8 = 0x03;
/// Write the output voltage potentiometer code.
pub const CMD_WRITE_VOUT: u8 = 0x06;
pub const CMD_READ_VOUT: u8 = 0x07;
pub const CMD_INC_VOUT: u8 = 0x0c;
pub const CMD_DEC_VOUT: u8 = 0x0d;
pub const CMD_LOAD_DEFAULTS: u8 = 0x0e;
pub const CMD_SCRIPT_START: u8 = 0x10;
pub const CMD_SCRIPT_STOP: u8 = 0x11;
pub const CMD_SLEEP: u8 = 0x12;

// ---------------------------------------------------------------------------
// Status report layout
// ---------------------------------------------------------------------------

pub const OFFSET_PACKET_TYPE: usize = 0;
pub const OFFSET_MODE: usize = 1;
pub const OFFSET_STATE: usize = 2;
pub const OFFSET_INPUT_VOLTAGE: usize = 3;
pub const OFFSET_IGNITION_VOLTAGE: usize = 4;
pub const OFFSET_OUTPUT_VOLTAGE: usize = 5;
pub const OFFSET_FLAGS: usize = 6;
pub const OFFSET_FIRMWARE: usize = 23;

/// Mode byte bits 0-1.
pub const MODE_RUN_MASK: u8 = 0x03;
/// Mode byte bits 2-4, after shifting.
pub const MODE_VOLTAGE_CONFIG_SHIFT: u8 = 2;
/// Mode byte bits 5-7, after shifting.
pub const MODE_TIME_CONFIG_SHIFT: u8 = 5;
/// Width mask for the voltage and time config fields.
pub const MODE_CONFIG_MASK: u8 = 0x07;

pub const FLAG_POWER_SWITCH: u8 = 0x04;
pub const FLAG_OUTPUT_ENABLE: u8 = 0x08;
pub const FLAG_AUX_VIN_ENABLE: u8 = 0x10;

/// Firmware byte: high 3 bits major, low 5 bits minor.
pub const FIRMWARE_MAJOR_SHIFT: u8 = 5;
pub const FIRMWARE_MINOR_MASK: u8 = 0x1f;

/// State code reported while the converter is running normally.
pub const STATE_GOOD: u8 = 7;
/// State code reported about a minute before the converter shuts down.
pub const STATE_IMMINENT_SHUTDOWN: u8 = 18;

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Analog calibration of one converter model.
///
/// The scale factors are the single-precision values burned into the
/// vendor tooling; they are widened to `f64` only at the point of use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Volts per input-voltage code.
    pub input_scale: f32,
    /// Volts per ignition-voltage code.
    pub ignition_scale: f32,
    /// Volts per output-voltage code.
    pub output_scale: f32,
    /// Feedback reference voltage of the regulator.
    pub vref: f64,
    /// Upper feedback resistor, ohms.
    pub r1: f64,
    /// Series resistor below the potentiometer, ohms.
    pub r2: f64,
    /// Potentiometer wiper resistance, ohms.
    pub rw: f64,
    /// Potentiometer full-scale resistance, ohms.
    pub rp: f64,
    /// Potentiometer steps across `rp`.
    pub pot_steps: f64,
}

/// Calibration of the DCDC-USB.
pub const DCDC_USB: Calibration = Calibration {
    input_scale: 0.1558,
    ignition_scale: 0.1558,
    output_scale: 0.1170,
    vref: 0.8,
    r1: 49900.0,
    r2: 1500.0,
    rw: 75.0,
    rp: 10000.0,
    pot_steps: 257.0,
};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Timeout for interrupt writes and the handshake control transfer.
pub const USB_TIMEOUT: Duration = Duration::from_millis(1000);
/// Timeout for the status report read during a poll.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);
/// Delay between claiming the interface and selecting the alt setting.
pub const CLAIM_SETTLE_DELAY: Duration = Duration::from_micros(100);
/// Delay before releasing the interface, lets in-flight transfers finish.
pub const CLOSE_SETTLE_DELAY: Duration = Duration::from_secs(1);
