//! Data model: actions, sets, the set registry and the execution queue.
//!
//! Every set carries exactly [`MAX_ACTIONS`] slots from the moment it is created.
//! Unrecorded slots are skipped during playback.

pub mod action;
pub mod queue;
pub mod registry;
pub mod set;
pub mod workspace;

pub use action::{
    Action, ActionUpdate, ClickType, DEFAULT_DELAY_SECS, MAX_ACTIONS, Position, parse_delay,
};
pub use queue::ExecutionQueue;
pub use registry::SetRegistry;
pub use set::{ActionSet, clamp_loop_count, parse_loop_count};
pub use workspace::Workspace;
