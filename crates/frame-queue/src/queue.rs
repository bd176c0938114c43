//! Bounded FIFO queue implementation

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

/// Errors surfaced by the queue
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Queue was constructed with capacity 0
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    /// No message arrived before the receive deadline
    #[error("timed out after {0:?} waiting for a message")]
    Timeout(Duration),
}

/// Pre-allocated ring storage indexed by head/tail counters.
struct Ring<T> {
    slots: Vec<Option<T>>,
    /// Write position
    head: usize,
    /// Read position
    tail: usize,
    len: usize,
}

impl<T> Ring<T> {
    fn push(&mut self, item: T) -> Result<(), T> {
        if self.len == self.slots.len() {
            return Err(item);
        }
        self.slots[self.head] = Some(item);
        self.head = (self.head + 1) % self.slots.len();
        self.len += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.tail].take();
        self.tail = (self.tail + 1) % self.slots.len();
        self.len -= 1;
        item
    }
}

/// Fixed-capacity FIFO queue of owned message handles.
///
/// The producer side (`try_push`) never blocks; the consumer side (`recv`)
/// is an async wait with an optional deadline. Capacity is fixed at
/// construction and the queue never holds more than `capacity` items.
pub struct FrameQueue<T> {
    ring: Mutex<Ring<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> FrameQueue<T> {
    /// Create a queue with the given capacity.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        let slots = (0..capacity).map(|_| None).collect();
        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                len: 0,
            }),
            notify: Notify::new(),
            capacity,
        })
    }

    /// Non-blocking enqueue. Returns the item back to the caller when the
    /// queue is full so it can be released or dropped.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        {
            let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
            ring.push(item)?;
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Receive the next item in FIFO order, waiting forever when `timeout`
    /// is `None`.
    pub async fn recv(&self, timeout: Option<Duration>) -> Result<T, QueueError> {
        match timeout {
            None => Ok(self.recv_inner().await),
            Some(deadline) => tokio::time::timeout(deadline, self.recv_inner())
                .await
                .map_err(|_| {
                    debug!("queue receive timed out after {:?}", deadline);
                    QueueError::Timeout(deadline)
                }),
        }
    }

    async fn recv_inner(&self) -> T {
        loop {
            // Register interest before checking so a push between the check
            // and the await is not missed.
            let notified = self.notify.notified();
            if let Some(item) = self.pop() {
                return item;
            }
            notified.await;
        }
    }

    fn pop(&self) -> Option<T> {
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        ring.pop()
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).len
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            FrameQueue::<u32>::new(0),
            Err(QueueError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_fifo_order() {
        let queue = FrameQueue::new(10).unwrap();
        for i in 0..5u32 {
            queue.try_push(i).unwrap();
        }
        for i in 0..5u32 {
            assert_eq!(queue.pop(), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_returns_item() {
        let queue = FrameQueue::new(3).unwrap();
        for i in 0..3u32 {
            queue.try_push(i).unwrap();
        }
        assert_eq!(queue.try_push(99), Err(99));
        assert_eq!(queue.len(), 3);
        // Existing items unaffected, still in order
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push() {
        let queue = Arc::new(FrameQueue::new(4).unwrap());
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.recv(None).await.unwrap() })
        };
        tokio::task::yield_now().await;
        queue.try_push(7u32).unwrap();
        assert_eq!(consumer.await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recv_timeout() {
        let queue = FrameQueue::<u32>::new(2).unwrap();
        let deadline = Duration::from_millis(50);
        assert_eq!(
            queue.recv(Some(deadline)).await,
            Err(QueueError::Timeout(deadline))
        );
    }

    #[tokio::test]
    async fn test_recv_returns_queued_item_immediately() {
        let queue = FrameQueue::new(2).unwrap();
        queue.try_push(1u32).unwrap();
        assert_eq!(queue.recv(Some(Duration::from_millis(10))).await, Ok(1));
    }

    proptest! {
        /// Accepted item count is min(offered, capacity) and order is
        /// preserved when the consumer is fully behind.
        #[test]
        fn prop_conservation_and_order(capacity in 1usize..32, offered in 0usize..64) {
            let queue = FrameQueue::new(capacity).unwrap();
            let mut accepted = Vec::new();
            for i in 0..offered {
                if queue.try_push(i).is_ok() {
                    accepted.push(i);
                }
            }
            prop_assert_eq!(accepted.len(), offered.min(capacity));
            prop_assert!(queue.len() <= capacity);
            let mut drained = Vec::new();
            while let Some(item) = queue.pop() {
                drained.push(item);
            }
            prop_assert_eq!(drained, accepted);
        }
    }
}
