//! CAN Link Layer
//!
//! This crate provides the pieces the consumer tasks see of the CAN bus:
//! validated identifiers, frame data with typed payload views, a fixed-slot
//! frame pool handing out move-only handles, a transport trait with a mock
//! implementation for tests, and the bus adapter that routes received
//! frames to per-task queues.

mod adapter;
mod error;
mod frame;
mod id;
mod pool;
mod transport;

pub use adapter::CanAdapter;
pub use error::CanError;
pub use frame::{BrakeStatus, EngineSpeedRecord, FrameData, PAYLOAD_LEN};
pub use id::CanId;
pub use pool::{FramePool, FrameHandle};
pub use transport::{CanTransport, MockTransport, RxStatus};
