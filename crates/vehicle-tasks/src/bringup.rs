//! Startup Phase
//!
//! One-shot bring-up of the message-driven core: validate the startup
//! constants, walk the transport through init -> rate -> start with queue
//! creation and identifier registration in between, then spawn the
//! consumer tasks in priority order and the supervisor above them. The
//! resulting state lives for the rest of the process; there is no
//! teardown.

use crate::brake::BrakeTask;
use crate::config::{CoreConfig, TaskPriority};
use crate::indicators::IndicatorDriver;
use crate::speed::EngineSpeedTask;
use can_link::{CanAdapter, CanError, CanId, CanTransport, FrameHandle, FramePool};
use frame_queue::{FrameQueue, QueueError};
use speed_cell::SpeedCell;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors that abort bring-up
#[derive(Debug, Error)]
pub enum BringupError {
    /// Malformed startup constants
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Identifier or transport failure during bring-up
    #[error(transparent)]
    Can(#[from] CanError),

    /// Queue creation failure
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Handles to the running core.
pub struct CoreHandles<T: CanTransport> {
    pub adapter: Arc<CanAdapter<T>>,
    pub cell: SpeedCell,
    pub brake_queue: Arc<FrameQueue<FrameHandle>>,
    pub speed_queue: Arc<FrameQueue<FrameHandle>>,
    /// Spawned tasks, highest priority first. They run for the process
    /// lifetime and are never joined.
    pub tasks: Vec<JoinHandle<()>>,
}

/// Bring up the core and spawn its tasks.
pub fn bring_up<T: CanTransport + 'static>(
    mut transport: T,
    indicators: Arc<dyn IndicatorDriver>,
    config: CoreConfig,
) -> Result<CoreHandles<T>, BringupError> {
    config.validate().map_err(BringupError::InvalidConfig)?;

    let brake_id = CanId::standard(config.brake_id)?;
    let engine_speed_id = CanId::standard(config.engine_speed_id)?;

    info!(
        "bringing up CAN core: brake {}, engine speed {}, queue depth {}",
        brake_id, engine_speed_id, config.queue_capacity
    );

    transport.initialize()?;
    transport.configure_rate(config.bitrate, config.bus_mode)?;

    let pool = FramePool::new(config.pool_slots);
    let brake_queue = Arc::new(FrameQueue::new(config.queue_capacity)?);
    let speed_queue = Arc::new(FrameQueue::new(config.queue_capacity)?);

    let mut adapter = CanAdapter::new(transport, pool);
    adapter.register(&[brake_id], brake_queue.clone())?;
    adapter.register(&[engine_speed_id], speed_queue.clone())?;
    adapter.start()?;
    let adapter = Arc::new(adapter);

    let cell = SpeedCell::default();

    let brake_task = BrakeTask::new(
        brake_queue.clone(),
        adapter.clone(),
        cell.clone(),
        indicators.clone(),
        engine_speed_id,
        &config,
    );
    let speed_task = EngineSpeedTask::new(
        speed_queue.clone(),
        adapter.clone(),
        cell.clone(),
        indicators,
        &config,
    );

    let supervisor = supervisor_loop(
        adapter.clone(),
        brake_queue.clone(),
        speed_queue.clone(),
        config.supervisor_period,
    );

    // Spawn in priority order, highest precedence first.
    let mut entries: Vec<(TaskPriority, Pin<Box<dyn Future<Output = ()> + Send>>)> = vec![
        (config.priorities.supervisor, Box::pin(supervisor)),
        (config.priorities.brake, Box::pin(brake_task.run())),
        (config.priorities.engine_speed, Box::pin(speed_task.run())),
    ];
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    let tasks = entries
        .into_iter()
        .map(|(priority, future)| {
            debug!("spawning task at priority {}", priority.0);
            tokio::spawn(future)
        })
        .collect();

    Ok(CoreHandles {
        adapter,
        cell,
        brake_queue,
        speed_queue,
        tasks,
    })
}

/// Supervisor heartbeat: periodic health log of queue depths and adapter
/// drop counters.
async fn supervisor_loop<T: CanTransport>(
    adapter: Arc<CanAdapter<T>>,
    brake_queue: Arc<FrameQueue<FrameHandle>>,
    speed_queue: Arc<FrameQueue<FrameHandle>>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        debug!(
            "supervisor: brake queue {}/{}, speed queue {}/{}, dropped {}, unbound {}",
            brake_queue.len(),
            brake_queue.capacity(),
            speed_queue.len(),
            speed_queue.capacity(),
            adapter.dropped_frames(),
            adapter.discarded_unbound()
        );
    }
}
