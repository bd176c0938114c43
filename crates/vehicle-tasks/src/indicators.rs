//! Status Indicator Boundary
//!
//! Indicators are the observable side effects of the tasks, analogous to
//! diagnostic LEDs. The driver itself is provided infrastructure; this
//! crate only consumes the boundary.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// The four indicators this core drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Toggled on every task wake-up
    Activity,
    /// Toggled when a brake-applied flag is decoded
    BrakeDetected,
    /// Toggled when the transport reports a receive fault
    Fault,
    /// Toggled when a queue receive fails
    QueueFailure,
}

/// Status indicator driver boundary.
pub trait IndicatorDriver: Send + Sync {
    fn toggle(&self, indicator: Indicator);
    fn set(&self, indicator: Indicator, level: bool);
}

/// Driver that logs indicator changes through `tracing`.
pub struct LogIndicators;

impl IndicatorDriver for LogIndicators {
    fn toggle(&self, indicator: Indicator) {
        debug!("indicator {:?} toggled", indicator);
    }

    fn set(&self, indicator: Indicator, level: bool) {
        debug!("indicator {:?} set to {}", indicator, level);
    }
}

#[derive(Default)]
struct IndicatorState {
    level: bool,
    toggles: usize,
}

/// Driver that records toggle counts and levels, for tests.
#[derive(Default)]
pub struct RecordingIndicators {
    state: Mutex<HashMap<Indicator, IndicatorState>>,
}

impl RecordingIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the indicator was toggled.
    pub fn toggles(&self, indicator: Indicator) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&indicator)
            .map(|s| s.toggles)
            .unwrap_or(0)
    }

    /// Current level of the indicator (off unless driven).
    pub fn level(&self, indicator: Indicator) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&indicator)
            .map(|s| s.level)
            .unwrap_or(false)
    }
}

impl IndicatorDriver for RecordingIndicators {
    fn toggle(&self, indicator: Indicator) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state.entry(indicator).or_default();
        entry.level = !entry.level;
        entry.toggles += 1;
    }

    fn set(&self, indicator: Indicator, level: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entry(indicator).or_default().level = level;
    }
}
