//! Outbound packet builders and the analog conversions.
//!
//! Everything here is pure: no I/O and no shared state.

use crate::error::DcdcError;
use crate::protocol::*;

/// `GET_ALL_VALUES` request: `[0x81, 0x00]`.
pub fn encode_get_all_values() -> [u8; GET_ALL_VALUES_LEN] {
    [GET_ALL_VALUES, 0x00]
}

/// Generic command request: `[0xB1, cmd, value, 0x00, 0x00]`.
pub fn encode_command(cmd: u8, value: u8) -> [u8; CMD_OUT_LEN] {
    [CMD_OUT, cmd, value, 0x00, 0x00]
}

/// Input voltage in volts for a raw code.
pub fn decode_input_voltage(cal: &Calibration, raw: u8) -> f64 {
    f64::from(raw) * f64::from(cal.input_scale)
}

/// Ignition voltage in volts for a raw code.
pub fn decode_ignition_voltage(cal: &Calibration, raw: u8) -> f64 {
    f64::from(raw) * f64::from(cal.ignition_scale)
}

/// Output voltage in volts for a raw code.
pub fn decode_output_voltage(cal: &Calibration, raw: u8) -> f64 {
    f64::from(raw) * f64::from(cal.output_scale)
}

/// Potentiometer code that sets the output to `volts`.
///
/// The regulator's feedback divider is `r1` over `r2` plus the digital
/// potentiometer, so the required pot resistance is
/// `vref * r1 / (volts - vref) - r2`, which maps linearly onto the pot's
/// steps. The result is clamped to `0..=255` low side first.
///
/// Fails for non-finite or non-positive input and at `volts == vref`, where
/// the divider has no solution.
pub fn encode_voltage(cal: &Calibration, volts: f64) -> Result<u8, DcdcError> {
    if !volts.is_finite() || volts <= 0.0 || volts == cal.vref {
        return Err(DcdcError::InvalidVoltageInput(volts.to_string()));
    }

    let rpot = cal.vref * cal.r1 / (volts - cal.vref) - cal.r2;
    let mut raw = cal.pot_steps * (rpot - cal.rw) / cal.rp;

    if raw < 0.0 {
        raw = 0.0;
    }
    if raw > 255.0 {
        raw = 255.0;
    }

    Ok(raw as u8)
}

/// Parse a voltage typed by a user.
pub fn parse_voltage(s: &str) -> Result<f64, DcdcError> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DcdcError::InvalidVoltageInput(s.to_string())),
    }
}
