//! Transport Boundary
//!
//! The transport is the already-provided link layer (controller bring-up,
//! bit timing, interrupts). This core only consumes the boundary below;
//! `MockTransport` stands in for hardware in tests.

use crate::error::CanError;
use crate::frame::PAYLOAD_LEN;
use crate::id::CanId;
use std::sync::Mutex;
use tracing::{debug, info};

/// Receive-side link status. Sticky in the driver: reflects the most
/// recent fault until the link next receives cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxStatus {
    /// No fault on the receive path
    #[default]
    Ok,
    /// Controller went bus-off
    BusOff,
    /// Framing error on a received frame
    FrameError,
    /// Receive buffer overrun in the controller
    Overrun,
}

/// The CAN link layer as seen by this core.
pub trait CanTransport: Send + Sync {
    /// Bring up the controller.
    fn initialize(&mut self) -> Result<(), CanError>;

    /// Configure bit timing. `mode` selects sampling options and is passed
    /// through to the driver untouched.
    fn configure_rate(&mut self, bitrate: u32, mode: u8) -> Result<(), CanError>;

    /// Enter normal operation. Registrations must be in place before this.
    fn start(&mut self) -> Result<(), CanError>;

    /// Transmit one frame.
    fn send(&self, id: CanId, bytes: [u8; PAYLOAD_LEN]) -> Result<(), CanError>;

    /// Most recent receive-side fault, sticky until the next clean receive.
    fn last_error(&self) -> RxStatus;
}

/// In-memory transport for tests (no hardware required).
///
/// Records every transmitted frame and lets tests inject send failures and
/// receive-side fault status.
pub struct MockTransport {
    started: bool,
    bitrate: Option<(u32, u8)>,
    sent: Mutex<Vec<(CanId, [u8; PAYLOAD_LEN])>>,
    send_failure: Mutex<Option<CanError>>,
    rx_status: Mutex<RxStatus>,
}

impl MockTransport {
    /// Create a mock transport, already in the pre-init state.
    pub fn new() -> Self {
        info!("creating mock CAN transport");
        Self {
            started: false,
            bitrate: None,
            sent: Mutex::new(Vec::new()),
            send_failure: Mutex::new(None),
            rx_status: Mutex::new(RxStatus::Ok),
        }
    }

    /// Frames transmitted so far.
    pub fn sent_frames(&self) -> Vec<(CanId, [u8; PAYLOAD_LEN])> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make every subsequent `send` fail with the given error until cleared
    /// with `None`.
    pub fn set_send_failure(&self, failure: Option<CanError>) {
        *self.send_failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    /// Set the sticky receive-side status the driver would report.
    pub fn set_rx_status(&self, status: RxStatus) {
        *self.rx_status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Configured (bitrate, mode), if any.
    pub fn configured_rate(&self) -> Option<(u32, u8)> {
        self.bitrate
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CanTransport for MockTransport {
    fn initialize(&mut self) -> Result<(), CanError> {
        debug!("mock transport initialized");
        Ok(())
    }

    fn configure_rate(&mut self, bitrate: u32, mode: u8) -> Result<(), CanError> {
        debug!("mock transport rate set to {} (mode {})", bitrate, mode);
        self.bitrate = Some((bitrate, mode));
        Ok(())
    }

    fn start(&mut self) -> Result<(), CanError> {
        info!("mock transport started");
        self.started = true;
        Ok(())
    }

    fn send(&self, id: CanId, bytes: [u8; PAYLOAD_LEN]) -> Result<(), CanError> {
        if let Some(failure) = self
            .send_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(failure);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, bytes));
        Ok(())
    }

    fn last_error(&self) -> RxStatus {
        *self.rx_status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_sent_frames() {
        let transport = MockTransport::new();
        let id = CanId::standard(0x280).unwrap();
        transport.send(id, [1; 8]).unwrap();
        assert_eq!(transport.sent_frames(), vec![(id, [1; 8])]);
    }

    #[test]
    fn test_mock_send_failure_injection() {
        let transport = MockTransport::new();
        transport.set_send_failure(Some(CanError::TransportBusy));
        let id = CanId::standard(0x280).unwrap();
        assert_eq!(transport.send(id, [0; 8]), Err(CanError::TransportBusy));
        transport.set_send_failure(None);
        assert!(transport.send(id, [0; 8]).is_ok());
    }

    #[test]
    fn test_mock_rx_status_sticky() {
        let transport = MockTransport::new();
        assert_eq!(transport.last_error(), RxStatus::Ok);
        transport.set_rx_status(RxStatus::BusOff);
        assert_eq!(transport.last_error(), RxStatus::BusOff);
        // Stays until the driver reports a clean receive
        assert_eq!(transport.last_error(), RxStatus::BusOff);
    }
}
