use anyhow::{Context, Result, anyhow, bail};
use std::str::FromStr;

/// A single control line, e.g. `pause` or `c 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Toggle,
    Stop,
    /// Record the pointer into this slot of the active set (capture mode only).
    Capture(usize),
    Status,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| anyhow!("empty control line"))?
            .to_ascii_lowercase();
        let command = match verb.as_str() {
            "p" | "pause" => Self::Pause,
            "r" | "resume" => Self::Resume,
            "t" | "toggle" => Self::Toggle,
            "s" | "stop" => Self::Stop,
            "status" => Self::Status,
            "q" | "quit" | "exit" => Self::Quit,
            "c" | "capture" => {
                let raw = words
                    .next()
                    .ok_or_else(|| anyhow!("'{verb}' needs a slot number"))?;
                let slot = raw
                    .parse::<usize>()
                    .with_context(|| format!("invalid slot '{raw}'"))?;
                Self::Capture(slot)
            }
            other => bail!("unknown control command '{other}'"),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument '{extra}' after '{verb}'");
        }
        Ok(command)
    }
}
