use anyhow::{Context, Result, anyhow};
use enigo::Keyboard as _;
use enigo::Mouse as _;
use enigo::{Button, Coordinate, Direction, Enigo, Settings as EnigoSettings};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

use super::driver::InputDriver;
use crate::model::{ClickType, Position};

/// Pause between the two clicks of a double click.
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(40);

enum Request {
    MoveAndClick(Position, ClickType),
    Move(Position),
    Type(String),
    Locate,
}

type Reply = mpsc::Sender<Result<Option<Position>>>;

/// Real input through Enigo.
///
/// The `Enigo` handle lives on a dedicated input thread and is created lazily on
/// first use; this driver only forwards requests to it and waits for the reply.
pub struct EnigoDriver {
    requests: mpsc::Sender<(Request, Reply)>,
}

impl EnigoDriver {
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<(Request, Reply)>();
        thread::Builder::new()
            .name("macroqueue-input".into())
            .spawn(move || {
                let mut enigo: Option<Enigo> = None;
                for (request, reply) in rx {
                    let result = handle(&mut enigo, request);
                    // The caller may have given up waiting; nothing to do then.
                    let _ = reply.send(result);
                }
                debug!(target: "macroqueue::driver", "Input thread exiting");
            })
            .context("Failed to spawn input thread")?;
        Ok(Self { requests: tx })
    }

    fn call(&self, request: Request) -> Result<Option<Position>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send((request, reply_tx))
            .map_err(|_| anyhow!("input thread is no longer running"))?;
        reply_rx
            .recv()
            .context("input thread dropped the request")?
    }
}

impl InputDriver for EnigoDriver {
    fn name(&self) -> &'static str {
        "enigo"
    }

    fn move_and_click(&mut self, position: Position, click: ClickType) -> Result<()> {
        self.call(Request::MoveAndClick(position, click)).map(drop)
    }

    fn move_pointer(&mut self, position: Position) -> Result<()> {
        self.call(Request::Move(position)).map(drop)
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.call(Request::Type(text.to_string())).map(drop)
    }

    fn current_pointer_position(&mut self) -> Result<Position> {
        self.call(Request::Locate)?
            .ok_or_else(|| anyhow!("input thread returned no pointer position"))
    }
}

fn ensure_enigo(slot: &mut Option<Enigo>) -> Result<&mut Enigo> {
    if slot.is_none() {
        trace!(target: "macroqueue::driver", "Initializing Enigo");
        *slot = Some(Enigo::new(&EnigoSettings::default()).context("Failed to initialize Enigo")?);
    }
    slot.as_mut()
        .ok_or_else(|| anyhow!("Enigo handle missing after initialization"))
}

fn handle(slot: &mut Option<Enigo>, request: Request) -> Result<Option<Position>> {
    let enigo = ensure_enigo(slot)?;
    match request {
        Request::MoveAndClick(position, click) => {
            trace!(target: "macroqueue::driver", %position, ?click, "move_and_click");
            enigo
                .move_mouse(position.x, position.y, Coordinate::Abs)
                .with_context(|| format!("Failed to move pointer to {position}"))?;
            match click {
                ClickType::Left => enigo.button(Button::Left, Direction::Click)?,
                ClickType::Right => enigo.button(Button::Right, Direction::Click)?,
                ClickType::Double => {
                    enigo.button(Button::Left, Direction::Click)?;
                    thread::sleep(DOUBLE_CLICK_GAP);
                    enigo.button(Button::Left, Direction::Click)?;
                }
            }
            Ok(None)
        }
        Request::Move(position) => {
            trace!(target: "macroqueue::driver", %position, "move_pointer");
            enigo
                .move_mouse(position.x, position.y, Coordinate::Abs)
                .with_context(|| format!("Failed to move pointer to {position}"))?;
            Ok(None)
        }
        Request::Type(text) => {
            trace!(target: "macroqueue::driver", %text, "type_text");
            enigo.text(&text).context("Failed to type text")?;
            Ok(None)
        }
        Request::Locate => {
            let (x, y) = enigo.location().context("Failed to read pointer position")?;
            Ok(Some(Position::new(x, y)))
        }
    }
}
