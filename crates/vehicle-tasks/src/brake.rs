//! Brake Task
//!
//! Triggered by arriving brake-status frames. On every wake it toggles the
//! activity indicator, then decodes the foot-brake flag: applied writes 55
//! into the shared record's speed field (and toggles the brake-detected
//! indicator), released writes 10; both paths transmit the full record on
//! the engine-speed identifier. The frame is released exactly once on
//! every path where one was received.

use crate::config::CoreConfig;
use crate::indicators::{Indicator, IndicatorDriver};
use can_link::{BrakeStatus, CanAdapter, CanId, CanTransport, EngineSpeedRecord, FrameHandle};
use frame_queue::FrameQueue;
use speed_cell::{CellError, SpeedCell};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Speed value stored and transmitted when the foot brake is applied
pub const BRAKE_APPLIED_SPEED: u16 = 55;
/// Speed value stored and transmitted when the foot brake is released
pub const BRAKE_RELEASED_SPEED: u16 = 10;

/// Consumer task for brake-status frames.
pub struct BrakeTask<T: CanTransport> {
    queue: Arc<FrameQueue<FrameHandle>>,
    adapter: Arc<CanAdapter<T>>,
    cell: SpeedCell,
    indicators: Arc<dyn IndicatorDriver>,
    /// Identifier the outgoing record is sent on
    tx_id: CanId,
    receive_timeout: Option<Duration>,
    lock_deadline: Option<Duration>,
}

impl<T: CanTransport> BrakeTask<T> {
    pub fn new(
        queue: Arc<FrameQueue<FrameHandle>>,
        adapter: Arc<CanAdapter<T>>,
        cell: SpeedCell,
        indicators: Arc<dyn IndicatorDriver>,
        tx_id: CanId,
        config: &CoreConfig,
    ) -> Self {
        Self {
            queue,
            adapter,
            cell,
            indicators,
            tx_id,
            receive_timeout: config.receive_timeout,
            lock_deadline: config.lock_deadline,
        }
    }

    /// Run forever: wait for a message, process it, wait again.
    pub async fn run(self) {
        loop {
            self.run_once().await;
        }
    }

    /// One wait-process cycle.
    pub async fn run_once(&self) {
        let received = self.queue.recv(self.receive_timeout).await;

        // Toggled on every wake, before the receive result is inspected.
        self.indicators.toggle(Indicator::Activity);

        let handle = match received {
            Ok(handle) => handle,
            Err(e) => {
                // Receive failed: no frame to release, skip the flag logic.
                debug!("brake task receive failed: {}", e);
                return;
            }
        };

        match BrakeStatus::decode(handle.frame()) {
            Ok(status) => self.process(status).await,
            Err(e) => debug!("malformed brake frame: {}", e),
        }

        handle.release();
    }

    async fn process(&self, status: BrakeStatus) {
        let speed = if status.foot_brake {
            self.indicators.toggle(Indicator::BrakeDetected);
            BRAKE_APPLIED_SPEED
        } else {
            BRAKE_RELEASED_SPEED
        };

        // Write the speed field and snapshot the record in one lock scope
        // so the transmitted payload is exactly what was stored.
        match self.store_and_snapshot(speed).await {
            Ok(record) => {
                if let Err(e) = self.adapter.send(self.tx_id, record.to_bytes()) {
                    warn!("engine-speed transmit failed: {}", e);
                }
            }
            Err(CellError::LockTimeout(deadline)) => {
                debug!("speed record busy for {:?}, update skipped", deadline);
            }
        }
    }

    async fn store_and_snapshot(&self, speed: u16) -> Result<EngineSpeedRecord, CellError> {
        let update = |record: &mut EngineSpeedRecord| {
            record.engine_speed = speed;
            *record
        };
        match self.lock_deadline {
            Some(deadline) => self.cell.with_lock_deadline(deadline, update).await,
            None => Ok(self.cell.with_lock(update).await),
        }
    }
}
