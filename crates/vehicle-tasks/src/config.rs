//! Core Configuration
//!
//! Fixed identifiers, queue depths, and task priorities. There is no
//! external configuration system, only these startup constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ordered task priority. Higher value means higher precedence; the
/// numeric direction is an internal convention, only the ordering is part
/// of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskPriority(pub u8);

/// Fixed priorities for the three tasks. The supervisor sits above both
/// consumers, and the brake task above the engine-speed task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskPriorities {
    pub supervisor: TaskPriority,
    pub brake: TaskPriority,
    pub engine_speed: TaskPriority,
}

impl Default for TaskPriorities {
    fn default() -> Self {
        Self {
            supervisor: TaskPriority(10),
            brake: TaskPriority(5),
            engine_speed: TaskPriority(4),
        }
    }
}

/// Startup configuration for the message-driven core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Identifier of incoming brake-status frames (11-bit)
    pub brake_id: u32,
    /// Identifier of engine-speed frames, incoming and outgoing (11-bit)
    pub engine_speed_id: u32,
    /// Depth of each per-task queue
    pub queue_capacity: usize,
    /// Number of slots in the shared frame pool
    pub pool_slots: usize,
    /// Bus bitrate in bit/s
    pub bitrate: u32,
    /// Driver sampling mode, passed through untouched
    pub bus_mode: u8,
    /// Task priorities
    pub priorities: TaskPriorities,
    /// Consumer receive deadline; `None` waits forever (the default)
    pub receive_timeout: Option<Duration>,
    /// Bounded-wait deadline for the shared-record lock; `None` waits
    /// forever (the default)
    pub lock_deadline: Option<Duration>,
    /// Supervisor heartbeat period
    pub supervisor_period: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            brake_id: 0x288,
            engine_speed_id: 0x280,
            queue_capacity: 10,
            pool_slots: 20,
            bitrate: 500_000,
            bus_mode: 0,
            priorities: TaskPriorities::default(),
            receive_timeout: None,
            lock_deadline: None,
            supervisor_period: Duration::from_secs(1),
        }
    }
}

impl CoreConfig {
    /// Check the startup constants. Violations are programmer errors and
    /// abort bring-up.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue capacity must be at least 1".into());
        }
        if self.pool_slots == 0 {
            return Err("frame pool must have at least one slot".into());
        }
        if self.brake_id == self.engine_speed_id {
            return Err(format!(
                "brake and engine-speed identifiers must differ (both {:#x})",
                self.brake_id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_invalid() {
        let config = CoreConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_identical_ids_invalid() {
        let config = CoreConfig {
            brake_id: 0x280,
            engine_speed_id: 0x280,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        let priorities = TaskPriorities::default();
        assert!(priorities.supervisor > priorities.brake);
        assert!(priorities.brake > priorities.engine_speed);
    }
}
