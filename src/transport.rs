//! Interrupt transfer transport.
//!
//! Every exchange with the converter is a single interrupt transfer on
//! endpoint 1: requests go out on 0x01, the status report comes back on
//! 0x81. Nothing here retries; one call is one transfer.

use std::time::Duration;

use log::warn;

use crate::device::DcdcDevice;
use crate::error::DcdcError;
use crate::protocol::*;
use crate::usb::UsbHandle;

impl<H: UsbHandle> DcdcDevice<H> {
    /// Send `data` to the OUT endpoint.
    ///
    /// A short write is logged and the actual byte count returned; use
    /// [`write_exact`](Self::write_exact) to treat it as an error instead.
    pub fn write(&self, data: &[u8]) -> Result<usize, DcdcError> {
        let written = self.handle.write_interrupt(ENDPOINT_OUT, data, USB_TIMEOUT)?;
        if written != data.len() {
            warn!("short interrupt write: {} of {} bytes", written, data.len());
        }
        Ok(written)
    }

    /// Send `data` to the OUT endpoint, failing with
    /// [`DcdcError::ShortWrite`] unless every byte went out.
    pub fn write_exact(&self, data: &[u8]) -> Result<(), DcdcError> {
        let written = self.write(data)?;
        if written != data.len() {
            return Err(DcdcError::ShortWrite { expected: data.len(), got: written });
        }
        Ok(())
    }

    /// Read up to `buf.len()` bytes from the IN endpoint.
    pub fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, DcdcError> {
        let len = self.handle.read_interrupt(ENDPOINT_IN, buf, timeout)?;
        if len != buf.len() {
            warn!("short interrupt read: {} of {} bytes", len, buf.len());
        }
        Ok(len)
    }

    /// Read one full status-report-sized packet.
    pub fn read_report(&self, timeout: Duration) -> Result<[u8; STATUS_REPORT_LEN], DcdcError> {
        let mut buf = [0u8; STATUS_REPORT_LEN];
        let len = self.read(&mut buf, timeout)?;
        if len != STATUS_REPORT_LEN {
            return Err(DcdcError::ShortRead { expected: STATUS_REPORT_LEN, got: len });
        }
        Ok(buf)
    }
}
