//! Configuration module for macroqueue.
//!
//! Holds the engine [`Settings`] (runner pacing, event buffer, dry-run) and the
//! helpers to load and validate them.
//!
//! Example:
//! use macroqueue::config::load_from_path;
//!
//! let settings = load_from_path("settings.json")?;

pub mod loader;
pub mod models;

pub use models::Settings;

pub use loader::{
    load_from_path, load_from_path_async, load_from_reader, load_from_str, validate_settings,
};
