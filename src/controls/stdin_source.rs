//! Stdin control source.
//!
//! Reads one control command per line from standard input, e.g. typing `p`
//! and Enter pauses playback. Blank lines are ignored; malformed lines are
//! logged with `warn!` and skipped. EOF or a closed channel ends the task.

use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::{error, info, trace, warn};

use super::{ControlCommand, ControlSource};

/// Source that reads control lines from stdin.
#[derive(Debug, Clone, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ControlSource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&self, sender: Sender<ControlCommand>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(target: "macroqueue::controls", "StdinSource task started (reading lines)");
            forward_lines(BufReader::new(io::stdin()), sender).await;
            trace!(target: "macroqueue::controls", "StdinSource task ended");
        })
    }
}

/// Parse each line of `reader` and forward the commands until EOF or until
/// the receiver is dropped. Returns the number of commands forwarded.
pub async fn forward_lines<R>(mut reader: R, sender: Sender<ControlCommand>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut forwarded = 0;
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!(target: "macroqueue::controls", "EOF on control input");
                break;
            }
            Ok(_) => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                match raw.parse::<ControlCommand>() {
                    Ok(command) => {
                        trace!(target: "macroqueue::controls", ?command, "Parsed control line");
                        if let Err(e) = sender.send(command).await {
                            error!(
                                target: "macroqueue::controls",
                                error = %e,
                                "Channel closed while sending control command; terminating"
                            );
                            break;
                        }
                        forwarded += 1;
                    }
                    Err(e) => {
                        warn!(
                            target: "macroqueue::controls",
                            error = %e,
                            line = raw,
                            "Ignoring malformed control line"
                        );
                    }
                }
            }
            Err(e) => {
                warn!(
                    target: "macroqueue::controls",
                    error = %e,
                    "Error reading control input; terminating"
                );
                break;
            }
        }
    }
    forwarded
}
