//! Frame Buffer Pool
//!
//! Received frames live in a pool of fixed size created at startup. The
//! pool hands out move-only handles; a handle is the only way to reach the
//! frame payload, and returning it (explicitly or by drop) is the only way
//! to free the slot. Ownership moves adapter -> queue -> task -> back to
//! the pool, never aliased.

use crate::frame::FrameData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

struct PoolState {
    /// Free slot indices
    free: Vec<usize>,
    /// Occupancy flag per slot, guards against stale returns
    in_use: Vec<bool>,
}

struct PoolShared {
    state: Mutex<PoolState>,
    slot_count: usize,
    /// Checkouts refused because no slot was free
    exhausted: AtomicUsize,
    /// Returns of a slot that was already free (ignored)
    stale_returns: AtomicUsize,
}

impl PoolShared {
    fn return_slot(&self, index: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.in_use[index] {
            self.stale_returns.fetch_add(1, Ordering::Relaxed);
            warn!("ignoring stale return of pool slot {}", index);
            return;
        }
        state.in_use[index] = false;
        state.free.push(index);
    }
}

/// Fixed-slot pool of frame buffers.
#[derive(Clone)]
pub struct FramePool {
    shared: Arc<PoolShared>,
}

impl FramePool {
    /// Create a pool with the given number of slots.
    pub fn new(slot_count: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    free: (0..slot_count).rev().collect(),
                    in_use: vec![false; slot_count],
                }),
                slot_count,
                exhausted: AtomicUsize::new(0),
                stale_returns: AtomicUsize::new(0),
            }),
        }
    }

    /// Check a frame into a free slot. Returns `None` when the pool is
    /// exhausted; the caller must drop the frame.
    pub fn checkout(&self, frame: FrameData) -> Option<FrameHandle> {
        let index = {
            let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
            match state.free.pop() {
                Some(index) => {
                    state.in_use[index] = true;
                    index
                }
                None => {
                    drop(state);
                    self.shared.exhausted.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };
        Some(FrameHandle {
            shared: self.shared.clone(),
            index,
            frame,
        })
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .free
            .len()
    }

    /// Total slot count.
    pub fn slot_count(&self) -> usize {
        self.shared.slot_count
    }

    /// Checkouts refused because the pool was exhausted.
    pub fn exhausted_count(&self) -> usize {
        self.shared.exhausted.load(Ordering::Relaxed)
    }

    /// Ignored stale slot returns.
    pub fn stale_return_count(&self) -> usize {
        self.shared.stale_returns.load(Ordering::Relaxed)
    }
}

/// Move-only handle to a pooled frame.
///
/// The handle owns its slot until released; dropping it releases the slot
/// exactly once, so a handle cannot leak a slot or free it twice.
pub struct FrameHandle {
    shared: Arc<PoolShared>,
    index: usize,
    frame: FrameData,
}

impl FrameHandle {
    /// The frame carried by this handle.
    pub fn frame(&self) -> &FrameData {
        &self.frame
    }

    /// Return the slot to the pool.
    pub fn release(self) {
        // Drop does the work; the method exists so call sites can state
        // intent at the end of a processing cycle.
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.shared.return_slot(self.index);
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHandle")
            .field("slot", &self.index)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::CanId;

    fn frame() -> FrameData {
        FrameData::new(CanId::standard(0x280).unwrap(), [0; 8])
    }

    #[test]
    fn test_checkout_and_release() {
        let pool = FramePool::new(2);
        let handle = pool.checkout(frame()).unwrap();
        assert_eq!(pool.available(), 1);
        handle.release();
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_exhaustion() {
        let pool = FramePool::new(1);
        let held = pool.checkout(frame()).unwrap();
        assert!(pool.checkout(frame()).is_none());
        assert_eq!(pool.exhausted_count(), 1);
        held.release();
        assert!(pool.checkout(frame()).is_some());
    }

    #[test]
    fn test_drop_releases_slot() {
        let pool = FramePool::new(1);
        {
            let _handle = pool.checkout(frame()).unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_stale_return_ignored() {
        let pool = FramePool::new(2);
        let handle = pool.checkout(frame()).unwrap();
        let index = handle.index;
        handle.release();
        // A second return of the same slot must not corrupt the free list.
        pool.shared.return_slot(index);
        assert_eq!(pool.stale_return_count(), 1);
        assert_eq!(pool.available(), 2);
    }
}
