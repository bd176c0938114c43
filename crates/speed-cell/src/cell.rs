//! Lock-scoped cell implementation

use can_link::EngineSpeedRecord;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors surfaced by the cell
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    /// Lock was not acquired before the deadline
    #[error("lock not acquired within {0:?}")]
    LockTimeout(Duration),
}

/// Mutex-guarded owner of the shared engine-speed record.
///
/// Cloning shares the same record. All reads and writes run inside a lock
/// scope; the guard is released on every exit path, including a panic in
/// the closure.
#[derive(Clone)]
pub struct SpeedCell {
    inner: Arc<Mutex<EngineSpeedRecord>>,
}

impl SpeedCell {
    /// Create a cell holding the given initial record.
    pub fn new(initial: EngineSpeedRecord) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Apply `f` to the record under the lock, waiting as long as needed.
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut EngineSpeedRecord) -> R) -> R {
        let mut record = self.inner.lock().await;
        f(&mut record)
    }

    /// Apply `f` under the lock, giving up after `deadline`.
    pub async fn with_lock_deadline<R>(
        &self,
        deadline: Duration,
        f: impl FnOnce(&mut EngineSpeedRecord) -> R,
    ) -> Result<R, CellError> {
        match tokio::time::timeout(deadline, self.inner.lock()).await {
            Ok(mut record) => Ok(f(&mut record)),
            Err(_) => {
                debug!("speed cell lock not acquired within {:?}", deadline);
                Err(CellError::LockTimeout(deadline))
            }
        }
    }

    /// Snapshot the current record.
    pub async fn read(&self) -> EngineSpeedRecord {
        self.with_lock(|record| *record).await
    }

    /// Replace the whole record.
    pub async fn write(&self, record: EngineSpeedRecord) {
        self.with_lock(|current| *current = record).await
    }
}

impl Default for SpeedCell {
    fn default() -> Self {
        Self::new(EngineSpeedRecord::default())
    }
}
