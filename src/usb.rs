//! USB host access used by the driver.
//!
//! [`UsbHost`] finds and opens the converter, [`UsbHandle`] is the open
//! device. Both are implemented for `rusb`; the driver itself only talks to
//! the traits, so sessions can run against a scripted device in tests.

use std::time::Duration;

use rusb::{Context, DeviceHandle, UsbContext};

/// Operations the driver needs from an open USB device.
///
/// Closing the device is dropping the handle.
pub trait UsbHandle {
    fn kernel_driver_active(&mut self, iface: u8) -> rusb::Result<bool>;
    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()>;
    fn reset(&mut self) -> rusb::Result<()>;
    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()>;
    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()>;
    fn release_interface(&mut self, iface: u8) -> rusb::Result<()>;
    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> rusb::Result<()>;

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;
    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize>;
}

/// Bus enumeration.
pub trait UsbHost {
    type Handle: UsbHandle;

    /// Open the first device on any bus matching `vendor_id`/`product_id`.
    ///
    /// Returns `Ok(None)` when no device matches.
    fn open_device(&self, vendor_id: u16, product_id: u16) -> rusb::Result<Option<Self::Handle>>;
}

/// libusb-backed host.
pub struct RusbHost {
    context: Context,
}

impl RusbHost {
    pub fn new() -> rusb::Result<Self> {
        Ok(Self { context: Context::new()? })
    }
}

impl UsbHost for RusbHost {
    type Handle = DeviceHandle<Context>;

    fn open_device(&self, vendor_id: u16, product_id: u16) -> rusb::Result<Option<Self::Handle>> {
        for device in self.context.devices()?.iter() {
            let desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if desc.vendor_id() == vendor_id && desc.product_id() == product_id {
                log::debug!(
                    "Found {:04x}:{:04x} on bus {} address {}",
                    vendor_id,
                    product_id,
                    device.bus_number(),
                    device.address()
                );
                return device.open().map(Some);
            }
        }

        Ok(None)
    }
}

impl<T: UsbContext> UsbHandle for DeviceHandle<T> {
    fn kernel_driver_active(&mut self, iface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, iface)
    }

    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, iface)
    }

    fn reset(&mut self) -> rusb::Result<()> {
        DeviceHandle::reset(self)
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        DeviceHandle::set_active_configuration(self, config)
    }

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, iface)
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, iface)
    }

    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> rusb::Result<()> {
        DeviceHandle::set_alternate_setting(self, iface, setting)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::write_control(self, request_type, request, value, index, buf, timeout)
    }

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_interrupt(self, endpoint, buf, timeout)
    }

    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::read_interrupt(self, endpoint, buf, timeout)
    }
}
