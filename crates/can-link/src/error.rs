//! CAN Link Error Types

use crate::id::CanId;
use thiserror::Error;

/// Errors that can occur on the CAN link
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanError {
    /// Identifier value does not fit its frame format
    #[error("identifier {raw:#x} does not fit {bits}-bit frame format")]
    InvalidId { raw: u32, bits: u8 },

    /// Identifier already routed to another queue
    #[error("identifier {0} is already bound to a queue")]
    DuplicateBinding(CanId),

    /// Frame payload shorter than the view it is decoded as
    #[error("frame truncated: payload view needs {needed} bytes, frame carries {got}")]
    Truncated { needed: u8, got: u8 },

    /// Transmit mailboxes are all occupied
    #[error("transport busy, frame not accepted for transmission")]
    TransportBusy,

    /// Transmit failed at the link level
    #[error("transport error: {0}")]
    TransportError(String),
}
