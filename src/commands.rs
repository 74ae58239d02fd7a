//! One-shot commands sent with the generic `CMD_OUT` packet.
//!
//! Commands are fire-and-forget: the device does not acknowledge them on
//! the interrupt IN endpoint, so nothing is read back.

use std::fmt;

use log::debug;

use crate::codec;
use crate::device::DcdcDevice;
use crate::error::DcdcError;
use crate::protocol::*;
use crate::usb::UsbHandle;

/// Command codes accepted in byte 1 of a `CMD_OUT` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetAuxWin,
    SetPowerSwitch,
    SetOutput,
    /// Write the output voltage potentiometer code.
    WriteVout,
    ReadVout,
    IncVout,
    DecVout,
    LoadDefaults,
    ScriptStart,
    ScriptStop,
    Sleep,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Self::SetAuxWin,
        Self::SetPowerSwitch,
        Self::SetOutput,
        Self::WriteVout,
        Self::ReadVout,
        Self::IncVout,
        Self::DecVout,
        Self::LoadDefaults,
        Self::ScriptStart,
        Self::ScriptStop,
        Self::Sleep,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::SetAuxWin => CMD_SET_AUX_WIN,
            Self::SetPowerSwitch => CMD_SET_PW_SWITCH,
            Self::SetOutput => CMD_SET_OUTPUT,
            Self::WriteVout => CMD_WRITE_VOUT,
            Self::ReadVout => CMD_READ_VOUT,
            Self::IncVout => CMD_INC_VOUT,
            Self::DecVout => CMD_DEC_VOUT,
            Self::LoadDefaults => CMD_LOAD_DEFAULTS,
            Self::ScriptStart => CMD_SCRIPT_START,
            Self::ScriptStop => CMD_SCRIPT_STOP,
            Self::Sleep => CMD_SLEEP,
        }
    }

    /// CLI name of the command.
    pub fn name(self) -> &'static str {
        match self {
            Self::SetAuxWin => "aux-win",
            Self::SetPowerSwitch => "power-switch",
            Self::SetOutput => "output",
            Self::WriteVout => "write-vout",
            Self::ReadVout => "read-vout",
            Self::IncVout => "inc-vout",
            Self::DecVout => "dec-vout",
            Self::LoadDefaults => "load-defaults",
            Self::ScriptStart => "script-start",
            Self::ScriptStop => "script-stop",
            Self::Sleep => "sleep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.code())
    }
}

impl<H: UsbHandle> DcdcDevice<H> {
    /// Send `command` with one value byte.
    ///
    /// Returns the number of bytes the transfer moved; a short write is
    /// logged but not an error.
    pub fn send_command(&self, command: Command, value: u8) -> Result<usize, DcdcError> {
        if self.debug {
            debug!("Sending command {} value {}", command, value);
        }
        self.write(&codec::encode_command(command.code(), value))
    }

    /// Set the output voltage. Returns the potentiometer code that was sent.
    ///
    /// The device does not confirm the new set point; poll afterwards to
    /// read the resulting output voltage.
    pub fn set_output_voltage(&self, volts: f64) -> Result<u8, DcdcError> {
        let code = codec::encode_voltage(&DCDC_USB, volts)?;
        if self.debug {
            debug!("Setting voltage byte to {}", code);
        }
        self.send_command(Command::WriteVout, code)?;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockHandle, MockHost, Script};

    #[test]
    fn command_codes() {
        assert_eq!(Command::WriteVout.code(), 0x06);
        assert_eq!(Command::SetPowerSwitch.code(), 0x02);
        assert_eq!(Command::LoadDefaults.code(), 0x0e);
        assert_eq!(Command::Sleep.code(), 0x12);
    }

    #[test]
    fn command_from_str() {
        for command in Command::ALL {
            assert_eq!(Command::from_str(command.name()), Some(command));
        }
        assert_eq!(Command::from_str("OUTPUT"), Some(Command::SetOutput));
        assert_eq!(Command::from_str("reboot"), None);
    }

    #[test]
    fn command_display() {
        assert_eq!(Command::WriteVout.to_string(), "write-vout (0x06)");
    }

    #[test]
    fn set_output_voltage_writes_command_only() {
        let host = MockHost::with_device(MockHandle::new(Script::default()));
        let device = DcdcDevice::open_with(&host, true).unwrap();
        let before = host.calls().len();

        assert_eq!(device.set_output_voltage(12.0).unwrap(), 51);

        let calls = host.calls();
        assert_eq!(
            &calls[before..],
            &[Call::WriteInterrupt { endpoint: 0x01, data: vec![0xb1, 0x06, 51, 0x00, 0x00] }]
        );
    }

    #[test]
    fn set_output_voltage_rejects_singularity_before_io() {
        let host = MockHost::with_device(MockHandle::new(Script::default()));
        let device = DcdcDevice::open_with(&host, false).unwrap();
        let before = host.calls().len();

        assert!(matches!(device.set_output_voltage(0.8), Err(DcdcError::InvalidVoltageInput(_))));
        assert_eq!(host.calls().len(), before);
    }

    #[test]
    fn send_command_packet() {
        let host = MockHost::with_device(MockHandle::new(Script::default()));
        let device = DcdcDevice::open_with(&host, false).unwrap();
        assert_eq!(device.send_command(Command::SetOutput, 1).unwrap(), 5);
        assert_eq!(
            host.calls().last(),
            Some(&Call::WriteInterrupt { endpoint: 0x01, data: vec![0xb1, 0x03, 0x01, 0x00, 0x00] })
        );
    }
}
