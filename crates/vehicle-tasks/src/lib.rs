//! Vehicle Consumer Tasks
//!
//! The message-driven core: two tasks fed by per-task bounded queues from
//! the CAN adapter, sharing one mutex-guarded engine-speed record. The
//! brake task reacts to brake-status frames and transmits the current
//! record; the engine-speed task keeps the record current from the bus.
//! `bring_up` wires everything and spawns the tasks in priority order.

mod brake;
mod bringup;
mod config;
mod indicators;
mod speed;

pub use brake::{BrakeTask, BRAKE_APPLIED_SPEED, BRAKE_RELEASED_SPEED};
pub use bringup::{bring_up, BringupError, CoreHandles};
pub use config::{CoreConfig, TaskPriorities, TaskPriority};
pub use indicators::{Indicator, IndicatorDriver, LogIndicators, RecordingIndicators};
pub use speed::EngineSpeedTask;
