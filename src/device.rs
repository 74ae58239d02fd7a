//! USB device discovery, opening, and lifecycle management.
//!
//! [`DcdcDevice::open`] scans the USB bus for the DCDC-USB, detaches any
//! kernel driver, claims interface 0, and runs the post-claim handshake.
//! [`DcdcDevice::close`] releases the interface after a settle delay; the
//! [`Drop`] impl releases it if the session is dropped without `close`.

use log::{debug, warn};
use rusb::{Context, DeviceHandle};

use crate::error::DcdcError;
use crate::protocol::*;
use crate::usb::{RusbHost, UsbHandle, UsbHost};

/// Handle to an opened DCDC-USB converter.
///
/// The session is the sole owner of the claimed handle. All transfers
/// against one session must be issued one at a time.
pub struct DcdcDevice<H: UsbHandle = DeviceHandle<Context>> {
    pub(crate) handle: H,
    pub(crate) debug: bool,
    released: bool,
}

impl DcdcDevice<DeviceHandle<Context>> {
    /// Scan all USB buses, open the first DCDC-USB, and claim its interface.
    ///
    /// With `debug` set, every step of the bring-up is logged.
    pub fn open(debug: bool) -> Result<Self, DcdcError> {
        let host = RusbHost::new()?;
        Self::open_with(&host, debug)
    }
}

impl<H: UsbHandle> DcdcDevice<H> {
    /// Open the converter through an arbitrary [`UsbHost`].
    pub fn open_with<U>(host: &U, debug: bool) -> Result<Self, DcdcError>
    where
        U: UsbHost<Handle = H>,
    {
        if debug {
            debug!("Looking for device DCDC-USB");
        }

        let mut handle = match host.open_device(VENDOR_ID, PRODUCT_ID)? {
            Some(handle) => handle,
            None => {
                if debug {
                    debug!("no device found");
                }
                return Err(DcdcError::NoDeviceFound);
            }
        };

        if debug {
            debug!("opening device succeeded");
        }

        // Platforms without kernel drivers report NotSupported here.
        if handle.kernel_driver_active(INTERFACE).unwrap_or(false) {
            if debug {
                debug!("Interface {} already claimed by kernel driver, detaching", INTERFACE);
            }
            handle.detach_kernel_driver(INTERFACE).map_err(DcdcError::DetachFailed)?;
        }

        if let Err(e) = handle.reset() {
            warn!("unable to reset device: {}", e);
        }

        if let Err(e) = handle.set_active_configuration(CONFIGURATION) {
            warn!("unable to set configuration: {}", e);
        }

        // Returning drops, and with it closes, the half-open handle.
        handle.claim_interface(INTERFACE).map_err(DcdcError::ClaimFailed)?;
        if debug {
            debug!("Claimed interface {}", INTERFACE);
        }

        std::thread::sleep(CLAIM_SETTLE_DELAY);

        if let Err(e) = handle.set_alternate_setting(INTERFACE, ALT_SETTING) {
            warn!("unable to set alternate configuration: {}", e);
        }

        if let Err(e) = handle.write_control(
            CLASS_REQUEST_TYPE_OUT,
            INIT_REQUEST,
            0,
            INTERFACE as u16,
            &[],
            USB_TIMEOUT,
        ) {
            warn!("unable to send control message: {}", e);
        }

        if debug {
            debug!("init complete");
        }

        Ok(Self { handle, debug, released: false })
    }

    /// Whether verbose bring-up and transfer diagnostics are enabled.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Wait for in-flight transfers to settle, release the interface, and
    /// close the device.
    pub fn close(mut self) {
        std::thread::sleep(CLOSE_SETTLE_DELAY);
        self.release();
        if self.debug {
            debug!("close complete");
        }
    }

    /// Run `f` against the session, then [`close`](Self::close) it whether
    /// or not `f` succeeded.
    pub fn run<T, E>(self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E> {
        let result = f(&self);
        self.close();
        result
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.handle.release_interface(INTERFACE) {
            warn!("Failed to release interface: {}", e);
        }
    }
}

impl<H: UsbHandle> Drop for DcdcDevice<H> {
    fn drop(&mut self) {
        self.release();
    }
}
