//! Shared Engine-Speed Cell
//!
//! The engine-speed record is the only piece of state touched by more than
//! one task. This crate owns it behind a mutex and exposes lock-scoped
//! accessors only; no API returns a guard or a reference into the cell,
//! so a lock bypass cannot be written against it.

mod cell;

pub use cell::{CellError, SpeedCell};
