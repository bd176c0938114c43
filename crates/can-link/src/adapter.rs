//! Bus Adapter
//!
//! Routes received frames to per-task queues by identifier. Each
//! identifier is bound to at most one queue, bindings are fixed at
//! startup, and the receive path never blocks: a frame with no binding is
//! discarded, and a frame for a full queue (or an exhausted pool) is
//! dropped and counted.

use crate::error::CanError;
use crate::frame::{FrameData, PAYLOAD_LEN};
use crate::id::CanId;
use crate::pool::{FrameHandle, FramePool};
use crate::transport::{CanTransport, RxStatus};
use frame_queue::FrameQueue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Adapter between the CAN transport and the consumer-task queues.
pub struct CanAdapter<T: CanTransport> {
    transport: T,
    pool: FramePool,
    bindings: Mutex<HashMap<CanId, Arc<FrameQueue<FrameHandle>>>>,
    /// Frames dropped because the destination queue was full or the pool
    /// had no free slot
    dropped: AtomicUsize,
    /// Frames discarded because no queue was bound to their identifier
    discarded_unbound: AtomicUsize,
}

impl<T: CanTransport> CanAdapter<T> {
    /// Create an adapter over an already started transport.
    pub fn new(transport: T, pool: FramePool) -> Self {
        Self {
            transport,
            pool,
            bindings: Mutex::new(HashMap::new()),
            dropped: AtomicUsize::new(0),
            discarded_unbound: AtomicUsize::new(0),
        }
    }

    /// Bind a set of identifiers to one destination queue.
    ///
    /// Fails without binding anything if any identifier is already bound;
    /// duplicate bindings are a startup programming error and abort
    /// initialization.
    pub fn register(
        &self,
        ids: &[CanId],
        queue: Arc<FrameQueue<FrameHandle>>,
    ) -> Result<(), CanError> {
        let mut bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        for id in ids {
            if bindings.contains_key(id) {
                return Err(CanError::DuplicateBinding(*id));
            }
        }
        for id in ids {
            bindings.insert(*id, queue.clone());
        }
        info!("registered {} identifier(s) to a queue", ids.len());
        Ok(())
    }

    /// Receive-path entry point, invoked by the transport driver for every
    /// frame taken off the bus. Never blocks.
    pub fn on_receive(&self, frame: FrameData) {
        let queue = {
            let bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
            bindings.get(&frame.id).cloned()
        };
        let Some(queue) = queue else {
            self.discarded_unbound.fetch_add(1, Ordering::Relaxed);
            debug!("discarding frame for unbound identifier {}", frame.id);
            return;
        };
        let Some(handle) = self.pool.checkout(frame) else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("frame pool exhausted, dropping frame for {}", frame.id);
            return;
        };
        if let Err(handle) = queue.try_push(handle) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("queue full, dropping frame for {}", frame.id);
            handle.release();
        }
    }

    /// Start the transport. Called once at the end of bring-up, after all
    /// registrations are in place.
    pub fn start(&mut self) -> Result<(), CanError> {
        self.transport.start()
    }

    /// Transmit one frame. Transport faults are surfaced to the caller;
    /// this core never retries.
    pub fn send(&self, id: CanId, bytes: [u8; PAYLOAD_LEN]) -> Result<(), CanError> {
        self.transport.send(id, bytes)
    }

    /// Most recent receive-side transport fault, sticky until the link next
    /// receives cleanly.
    pub fn last_rx_error(&self) -> RxStatus {
        self.transport.last_error()
    }

    /// Frames dropped on the receive path (full queue or exhausted pool).
    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Frames discarded because their identifier had no binding.
    pub fn discarded_unbound(&self) -> usize {
        self.discarded_unbound.load(Ordering::Relaxed)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn adapter_with_pool(slots: usize) -> CanAdapter<MockTransport> {
        CanAdapter::new(MockTransport::new(), FramePool::new(slots))
    }

    fn id(raw: u32) -> CanId {
        CanId::standard(raw).unwrap()
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let adapter = adapter_with_pool(4);
        let queue_a = Arc::new(FrameQueue::new(10).unwrap());
        let queue_b = Arc::new(FrameQueue::new(10).unwrap());
        adapter.register(&[id(0x288)], queue_a).unwrap();
        assert_eq!(
            adapter.register(&[id(0x280), id(0x288)], queue_b.clone()),
            Err(CanError::DuplicateBinding(id(0x288)))
        );
        // No partial binding: 0x280 must still be unbound
        adapter.on_receive(FrameData::new(id(0x280), [0; 8]));
        assert_eq!(adapter.discarded_unbound(), 1);
        assert!(queue_b.is_empty());
    }

    #[test]
    fn test_receive_routes_to_bound_queue() {
        let adapter = adapter_with_pool(4);
        let queue = Arc::new(FrameQueue::new(10).unwrap());
        adapter.register(&[id(0x288)], queue.clone()).unwrap();
        adapter.on_receive(FrameData::new(id(0x288), [1; 8]));
        assert_eq!(queue.len(), 1);
        assert_eq!(adapter.dropped_frames(), 0);
    }

    #[test]
    fn test_unbound_frame_discarded() {
        let adapter = adapter_with_pool(4);
        adapter.on_receive(FrameData::new(id(0x300), [0; 8]));
        assert_eq!(adapter.discarded_unbound(), 1);
        assert_eq!(adapter.dropped_frames(), 0);
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let adapter = adapter_with_pool(16);
        let queue = Arc::new(FrameQueue::new(10).unwrap());
        adapter.register(&[id(0x288)], queue.clone()).unwrap();
        for seq in 0..11u8 {
            adapter.on_receive(FrameData::new(id(0x288), [seq; 8]));
        }
        assert_eq!(queue.len(), 10);
        assert_eq!(adapter.dropped_frames(), 1);
        // The dropped frame's slot went back to the pool
        assert_eq!(adapter.pool.available(), 6);
    }

    #[test]
    fn test_pool_exhaustion_drops_and_counts() {
        let adapter = adapter_with_pool(1);
        let queue = Arc::new(FrameQueue::new(10).unwrap());
        adapter.register(&[id(0x288)], queue.clone()).unwrap();
        adapter.on_receive(FrameData::new(id(0x288), [0; 8]));
        adapter.on_receive(FrameData::new(id(0x288), [1; 8]));
        assert_eq!(queue.len(), 1);
        assert_eq!(adapter.dropped_frames(), 1);
    }

    #[test]
    fn test_send_passthrough() {
        let adapter = adapter_with_pool(1);
        adapter.send(id(0x280), [9; 8]).unwrap();
        assert_eq!(adapter.transport().sent_frames(), vec![(id(0x280), [9; 8])]);

        adapter
            .transport()
            .set_send_failure(Some(CanError::TransportBusy));
        assert_eq!(
            adapter.send(id(0x280), [9; 8]),
            Err(CanError::TransportBusy)
        );
    }
}
