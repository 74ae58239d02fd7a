//! Custom error types for the dcdcusb driver.
//!
//! Callers can distinguish session-open failures (fatal to the session) from
//! per-poll failures (the session stays usable) and pick their own policy:
//! abort on a malformed frame, or skip a sample in a monitor loop.

use thiserror::Error;

/// Top-level error type for all dcdcusb operations.
#[derive(Debug, Error)]
pub enum DcdcError {
    /// No device with the DCDC-USB vendor/product ID is on the bus.
    #[error("DCDC-USB not found. Make sure it's connected (04d8:d003).")]
    NoDeviceFound,

    /// A kernel driver holds interface 0 and could not be detached.
    #[error("unable to detach kernel driver: {0}")]
    DetachFailed(#[source] rusb::Error),

    /// Interface 0 could not be claimed.
    #[error("cannot claim interface: {0}")]
    ClaimFailed(#[source] rusb::Error),

    /// An interrupt write moved fewer bytes than requested.
    #[error("short interrupt write: {got} of {expected} bytes")]
    ShortWrite { expected: usize, got: usize },

    /// An interrupt read returned fewer bytes than requested.
    #[error("short interrupt read: {got} of {expected} bytes")]
    ShortRead { expected: usize, got: usize },

    /// The status report could not be received during a poll.
    #[error("receive failed: {0}")]
    ReadFailed(#[source] Box<DcdcError>),

    /// The response did not start with the all-values packet type.
    #[error("unexpected packet type 0x{got:02x} (expected 0x82)")]
    UnexpectedPacketType { got: u8 },

    /// A voltage that is not a number or lies outside the conversion's domain.
    #[error("invalid voltage '{0}'")]
    InvalidVoltageInput(String),

    /// A USB/libusb transport error occurred.
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// Invalid CLI argument value.
    #[error("Invalid value '{value}' for {arg}.\nValid values: {valid}")]
    InvalidArgument {
        arg: &'static str,
        value: String,
        valid: &'static str,
    },

    /// A required CLI argument value is missing.
    #[error("{0} requires a value")]
    MissingArgumentValue(String),
}
