//! Engine-Speed Task
//!
//! Keeps the shared record current from engine-speed frames on the bus.
//! On every wake it toggles the activity indicator and checks the
//! transport's sticky receive status, toggling the fault indicator on a
//! non-clean link. A successful receive copies the entire decoded record
//! into the shared cell, reserved words included; a failed receive
//! toggles the queue-failure indicator instead.

use crate::config::CoreConfig;
use crate::indicators::{Indicator, IndicatorDriver};
use can_link::{CanAdapter, CanTransport, EngineSpeedRecord, FrameHandle, RxStatus};
use frame_queue::FrameQueue;
use speed_cell::SpeedCell;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Consumer task for engine-speed frames.
pub struct EngineSpeedTask<T: CanTransport> {
    queue: Arc<FrameQueue<FrameHandle>>,
    adapter: Arc<CanAdapter<T>>,
    cell: SpeedCell,
    indicators: Arc<dyn IndicatorDriver>,
    receive_timeout: Option<Duration>,
}

impl<T: CanTransport> EngineSpeedTask<T> {
    pub fn new(
        queue: Arc<FrameQueue<FrameHandle>>,
        adapter: Arc<CanAdapter<T>>,
        cell: SpeedCell,
        indicators: Arc<dyn IndicatorDriver>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            queue,
            adapter,
            cell,
            indicators,
            receive_timeout: config.receive_timeout,
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

        if self.adapter.last_rx_error() != RxStatus::Ok {
            self.indicators.toggle(Indicator::Fault);
        }

        match received {
            Ok(handle) => {
                match EngineSpeedRecord::decode(handle.frame()) {
                    // Whole-record copy, reserved words included.
                    Ok(record) => self.cell.write(record).await,
                    Err(e) => debug!("malformed engine-speed frame: {}", e),
                }
                handle.release();
            }
            Err(e) => {
                debug!("engine-speed task receive failed: {}", e);
                self.indicators.toggle(Indicator::QueueFailure);
            }
        }
    }
}
