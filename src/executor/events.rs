use crate::model::Position;

/// Notifications published by the engine to any listener (UI, CLI, tests).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback was paused (`true`) or is no longer paused (`false`).
    StateChanged { paused: bool },

    /// The workspace changed in a way a view should re-read.
    RefreshRequested,

    /// The pointer position was read while capture mode was active.
    CoordinateCaptured { position: Position },

    /// An action fired. `pass` is the zero-based loop iteration of its set.
    ActionPerformed { set: String, slot: usize, pass: u32 },

    /// Playback ended and the runner is idle again.
    Finished { outcome: RunOutcome },
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue was exhausted.
    Completed,
    /// `stop()` was called, or the playing queue slot was removed.
    Stopped,
    /// The input driver failed; the message is the driver's error chain.
    Failed(String),
}
