//! Fixed-Capacity Message Queue
//!
//! Provides a bounded FIFO queue with a non-blocking producer side and an
//! async blocking consumer side, sized once at startup and never resized.

mod queue;

pub use queue::{FrameQueue, QueueError};
