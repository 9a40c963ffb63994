#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Macroqueue: record pointer/keyboard action sets and replay them from a queue, built on Enigo.
//!
//! A workspace holds named sets of up to 20 actions (a position, a click, optional text
//! and a delay) plus an execution queue of set names. The engine plays the queue on a
//! background task that can be paused, resumed and stopped at any moment.
//! - `model`: sets, registry, queue and the workspace that ties them together.
//! - `executor`: input drivers, runner state machine and the playback worker.
//! - `engine`: the facade a UI or CLI drives.
//! - `persistence`: JSON documents (load, save, schema).
//! - `config`: engine settings, loader and validation.
//! - `controls`: external control commands (stdin).
//!
//! Use `macroqueue::prelude::*` to bring commonly used items into scope quickly.

/// Public module: engine settings (models, loader).
pub mod config;
/// Public module: control sources (stdin) and the command language.
pub mod controls;
/// Public module: the engine facade.
pub mod engine;
/// Public module: typed library errors.
pub mod error;
/// Public module: input drivers and playback.
pub mod executor;
/// Public module: sets, registry, queue and workspace.
pub mod model;
/// Public module: document codec.
pub mod persistence;

pub use engine::Engine;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a level name (trace|debug|info|warn|error).
pub fn parse_level(name: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - `level` wins if given; otherwise honors the `RUST_LOG` environment variable.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);

    // Logs go to stderr so `show` output stays pipeable.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use macroqueue::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};
    pub use crate::error::{DocumentError, EngineError, RegistryError};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use std::time::Duration;

    pub use crate as macroqueue;
    pub use crate::config::Settings;
    pub use crate::engine::Engine;
    pub use crate::executor::{EngineEvent, InputDriver, RunOutcome, RunStatus};
    pub use crate::model::{Action, ActionSet, ActionUpdate, ClickType, Position, Workspace};

    // Frequently used internal modules
    pub use crate::{config, controls, executor, model, persistence};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level("warning"), Some(tracing::Level::WARN));
        assert_eq!(parse_level("loud"), None);
        assert_eq!(version(), PKG_VERSION);
    }
}
