#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for macroqueue.

This module wires together:
- `driver`: the `InputDriver` capability trait and the dry-run driver
- `enigo_driver`: real pointer/keyboard input through Enigo
- `state`: runner state machine and the step algorithm over the workspace
- `runner`: the background worker that plays the queue
- `events`: notifications published while editing and playing

Typical usage goes through [`crate::engine::Engine`], which owns the runner state
and spawns the worker.
*/

pub mod driver;
pub mod enigo_driver;
pub mod events;
pub(crate) mod runner;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use driver::{DryRunDriver, InputDriver, SharedDriver};
pub use enigo_driver::EnigoDriver;
pub use events::{EngineEvent, RunOutcome};
pub use state::{Cursors, RunStatus, RunnerState};

/// Build the driver selected by `dry_run`.
pub fn build_driver(dry_run: bool) -> anyhow::Result<Box<dyn InputDriver>> {
    if dry_run {
        Ok(Box::new(DryRunDriver::new()))
    } else {
        Ok(Box::new(EnigoDriver::new()?))
    }
}

pub(crate) fn share(driver: Box<dyn InputDriver>) -> SharedDriver {
    Arc::new(Mutex::new(driver))
}

/// Lock, recovering the data if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
