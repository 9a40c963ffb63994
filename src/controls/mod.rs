/*!
Control sources: the asynchronous side-channel that drives a running engine.

A control source reads some external input (today: standard input) and turns
it into [`ControlCommand`]s pushed through a bounded Tokio channel. The binary
owns the receiving end and dispatches each command to the [`crate::engine::Engine`].

Each source implementation is responsible for:
- Parsing raw input with [`ControlCommand::from_str`](std::str::FromStr)
- Sending with `send().await` so backpressure is respected
- Logging malformed input and continuing (never panicking inside tasks)
- Exiting cleanly when its input ends or the receiver is dropped
*/

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::info;

pub mod command;
pub mod stdin_source;

pub use command::ControlCommand;
pub use stdin_source::{StdinSource, forward_lines};

/// Trait implemented by all control sources.
pub trait ControlSource: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start the source in the background.
    fn start(&self, sender: Sender<ControlCommand>) -> JoinHandle<()>;
}

/// Spawn every source, returning their `JoinHandle`s.
pub fn spawn_all(
    sources: &[Box<dyn ControlSource>],
    sender: Sender<ControlCommand>,
) -> Vec<JoinHandle<()>> {
    sources
        .iter()
        .map(|src| {
            info!(
                target: "macroqueue::controls",
                source = %src.name(),
                "Starting control source"
            );
            src.start(sender.clone())
        })
        .collect()
}
