use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::model::{ClickType, Position};

/// Capabilities the runner needs from the operating system.
///
/// The engine never touches OS input APIs directly; everything goes through this trait.
pub trait InputDriver: Send {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Move the pointer to `position` and perform `click`.
    fn move_and_click(&mut self, position: Position, click: ClickType) -> Result<()>;

    /// Move the pointer without clicking.
    fn move_pointer(&mut self, position: Position) -> Result<()>;

    /// Type literal text (unicode).
    fn type_text(&mut self, text: &str) -> Result<()>;

    fn current_pointer_position(&mut self) -> Result<Position>;
}

/// Driver shared between the engine (capture, goto) and the playback worker.
pub type SharedDriver = Arc<Mutex<Box<dyn InputDriver>>>;

/// Logs every request instead of simulating input. Keeps a virtual pointer.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    pointer: Position,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputDriver for DryRunDriver {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn move_and_click(&mut self, position: Position, click: ClickType) -> Result<()> {
        info!(target: "macroqueue::driver", %position, ?click, "DRY-RUN move_and_click");
        self.pointer = position;
        Ok(())
    }

    fn move_pointer(&mut self, position: Position) -> Result<()> {
        info!(target: "macroqueue::driver", %position, "DRY-RUN move_pointer");
        self.pointer = position;
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        info!(target: "macroqueue::driver", %text, "DRY-RUN type_text");
        Ok(())
    }

    fn current_pointer_position(&mut self) -> Result<Position> {
        Ok(self.pointer)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_tracks_pointer() {
        let mut d = DryRunDriver::new();
        assert_eq!(d.current_pointer_position().unwrap(), Position::new(0, 0));
        d.move_and_click(Position::new(4, 2), ClickType::Right).unwrap();
        assert_eq!(d.current_pointer_position().unwrap(), Position::new(4, 2));
        d.type_text("ignored").unwrap();
        assert_eq!(d.name(), "dry-run");
    }
}
