//! DCDC-USB driver library.
//!
//! Polls telemetry from, and sends commands to, the DCDC-USB programmable
//! DC-DC converter over USB interrupt transfers.
//!
//! # Quick Start
//!
//! ```no_run
//! use dcdcusb::DcdcDevice;
//!
//! let device = DcdcDevice::open(false)?;
//! device.set_output_voltage(12.0)?;
//!
//! let telemetry = device.poll_telemetry()?;
//! println!("Output: {:.2} V", telemetry.output_voltage);
//! device.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
mod commands;
mod device;
mod error;
pub mod protocol;
mod status;
mod transport;
pub mod usb;

#[cfg(test)]
mod mock;

pub use commands::Command;
pub use device::DcdcDevice;
pub use error::DcdcError;
pub use protocol::{Calibration, DCDC_USB};
pub use status::{FirmwareVersion, PowerState, ReadValue, StatusReport, Telemetry};
