//! Scripted USB host and handle for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::usb::{UsbHandle, UsbHost};

/// One call made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    OpenDevice { vendor_id: u16, product_id: u16 },
    KernelDriverActive(u8),
    DetachKernelDriver(u8),
    Reset,
    SetConfiguration(u8),
    Claim(u8),
    Release(u8),
    SetAltSetting(u8, u8),
    Control { request_type: u8, request: u8, len: usize },
    WriteInterrupt { endpoint: u8, data: Vec<u8> },
    ReadInterrupt { endpoint: u8, len: usize, timeout: Duration },
    Close,
}

/// Canned behaviour of the mock device.
#[derive(Default)]
pub(crate) struct Script {
    pub kernel_driver_active: bool,
    pub detach_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub alt_setting_error: Option<rusb::Error>,
    pub control_error: Option<rusb::Error>,
    /// Results of successive interrupt writes; an empty queue writes everything.
    pub writes: VecDeque<rusb::Result<usize>>,
    /// Payloads of successive interrupt reads; an empty queue times out.
    pub reads: VecDeque<rusb::Result<Vec<u8>>>,
}

type CallLog = Rc<RefCell<Vec<Call>>>;

pub(crate) struct MockHandle {
    calls: CallLog,
    script: RefCell<Script>,
}

impl MockHandle {
    pub fn new(script: Script) -> Self {
        Self { calls: CallLog::default(), script: RefCell::new(script) }
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.log(Call::Close);
    }
}

impl UsbHandle for MockHandle {
    fn kernel_driver_active(&mut self, iface: u8) -> rusb::Result<bool> {
        self.log(Call::KernelDriverActive(iface));
        Ok(self.script.borrow().kernel_driver_active)
    }

    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        self.log(Call::DetachKernelDriver(iface));
        self.script.borrow().detach_error.map_or(Ok(()), Err)
    }

    fn reset(&mut self) -> rusb::Result<()> {
        self.log(Call::Reset);
        Ok(())
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        self.log(Call::SetConfiguration(config));
        Ok(())
    }

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()> {
        self.log(Call::Claim(iface));
        self.script.borrow().claim_error.map_or(Ok(()), Err)
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        self.log(Call::Release(iface));
        Ok(())
    }

    fn set_alternate_setting(&mut self, iface: u8, setting: u8) -> rusb::Result<()> {
        self.log(Call::SetAltSetting(iface, setting));
        self.script.borrow().alt_setting_error.map_or(Ok(()), Err)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        _value: u16,
        _index: u16,
        buf: &[u8],
        _timeout: Duration,
    ) -> rusb::Result<usize> {
        self.log(Call::Control { request_type, request, len: buf.len() });
        self.script.borrow().control_error.map_or(Ok(buf.len()), Err)
    }

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], _timeout: Duration) -> rusb::Result<usize> {
        self.log(Call::WriteInterrupt { endpoint, data: buf.to_vec() });
        self.script.borrow_mut().writes.pop_front().unwrap_or(Ok(buf.len()))
    }

    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        self.log(Call::ReadInterrupt { endpoint, len: buf.len(), timeout });
        let data = self.script.borrow_mut().reads.pop_front().unwrap_or(Err(rusb::Error::Timeout))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

/// Host with at most one device; hands it out on the first matching open.
pub(crate) struct MockHost {
    calls: CallLog,
    device: RefCell<Option<MockHandle>>,
}

impl MockHost {
    pub fn empty() -> Self {
        Self { calls: CallLog::default(), device: RefCell::new(None) }
    }

    pub fn with_device(mut handle: MockHandle) -> Self {
        let calls = CallLog::default();
        handle.calls = Rc::clone(&calls);
        Self { calls, device: RefCell::new(Some(handle)) }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl UsbHost for MockHost {
    type Handle = MockHandle;

    fn open_device(&self, vendor_id: u16, product_id: u16) -> rusb::Result<Option<MockHandle>> {
        self.calls.borrow_mut().push(Call::OpenDevice { vendor_id, product_id });
        Ok(self.device.borrow_mut().take())
    }
}

/// A well-formed status report: mode 0x05, state 7, 100/110/120 raw, flags 0x1c,
/// firmware 1.3.
pub(crate) fn sample_report() -> Vec<u8> {
    let mut report = vec![0u8; 24];
    report[..7].copy_from_slice(&[0x82, 0x05, 0x07, 100, 110, 120, 0x1c]);
    report[23] = (1 << 5) | 3;
    report
}
