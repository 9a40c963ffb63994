//! Error types surfaced at the library boundary.

use std::path::PathBuf;

/// Failures of set registry and queue edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown set '{0}'")]
    UnknownSet(String),

    #[error("a set named '{0}' already exists")]
    NameTaken(String),

    #[error("set names must not be empty")]
    InvalidName,

    #[error("no set is active")]
    NoActiveSet,

    #[error("slot {slot} is out of range (sets hold {capacity} actions)")]
    SlotOutOfRange { slot: usize, capacity: usize },
}

/// Failures while reading or writing a persisted document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to access document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document is missing the required '{0}' collection")]
    MissingCollection(&'static str),
}

/// Failures reported by the engine facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the execution queue is empty")]
    EmptyQueue,

    #[error("automation is already running")]
    AlreadyRunning,

    #[error("automation must be started from within a Tokio runtime")]
    NoRuntime,

    #[error("no document path is associated with this session")]
    NoDocumentPath,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("input driver failed: {0:#}")]
    Driver(anyhow::Error),
}
