//! Persistence codec for workspaces.
//!
//! A document stores every set (all slots, loop counts) and the execution queue.
//! Loading is forgiving about individual fields and strict about the two
//! top-level collections:
//! - a missing `sets` or `queue` is a [`DocumentError::MissingCollection`];
//! - any missing or malformed action field falls back to the slot default.
//!
//! Example:
//! use macroqueue::persistence;
//!
//! let workspace = persistence::load_from_path("macros.json")?;

pub mod codec;
pub mod document;
mod lenient;

pub use codec::{
    decode, encode, from_reader, from_str, generate_schema, load_from_path, load_from_path_async,
    save_to_path, save_to_path_async, to_string_pretty, write_schema_to_writer,
};
pub use document::{ActionRecord, Document, SetMap, SetRecord};

pub use crate::error::DocumentError;
