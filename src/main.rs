use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use macroqueue::Engine;
use macroqueue::config::{self as cfg, Settings};
use macroqueue::controls::{self, ControlCommand, ControlSource, StdinSource};
use macroqueue::executor::{self, DryRunDriver, EngineEvent, RunOutcome};
use macroqueue::model::{ActionUpdate, ClickType, Position, parse_delay};
use macroqueue::persistence;

/// Macroqueue CLI
#[derive(Debug, Parser)]
#[command(
    name = macroqueue::PKG_NAME,
    version = macroqueue::PKG_VERSION,
    about = "Record pointer/keyboard action sets and replay them from a queue"
)]
struct Args {
    /// Path to the macro document
    #[arg(short = 'd', long = "document", default_value = "macros.json")]
    document: PathBuf,

    /// Path to an engine settings JSON file
    #[arg(short = 's', long = "settings")]
    settings: Option<PathBuf>,

    /// Enable dry-run mode (log actions instead of simulating input)
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new document with one empty set
    Init {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },
    /// Print sets and the queue
    Show,
    /// Add a new empty set
    AddSet,
    /// Rename a set (queue entries follow)
    Rename { old: String, new: String },
    /// Set how many passes a set makes when queued (invalid values become 1)
    Loops { set: String, count: String },
    /// Record a position into a slot (0-based)
    Record {
        set: String,
        slot: usize,
        x: i32,
        y: i32,
    },
    /// Edit fields of a slot (0-based)
    Edit {
        set: String,
        slot: usize,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        click: Option<ClickType>,
        #[arg(long)]
        text: Option<String>,
        /// Seconds; malformed values fall back to the default delay
        #[arg(long)]
        delay: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        order: Option<i32>,
        /// Forget the recorded position
        #[arg(long)]
        unset_position: bool,
    },
    /// Reset a slot to its empty default
    Clear { set: String, slot: usize },
    /// Append a set to the execution queue
    Enqueue { set: String },
    /// Remove the queue entry at a 0-based index
    Dequeue { index: usize },
    /// Remove every queue entry
    ClearQueue,
    /// Play the queue; control lines are read from stdin
    Run {
        /// Enable capture mode so `c <slot>` records the pointer (saved on exit)
        #[arg(long)]
        capture: bool,
    },
    /// Print the JSON Schema for the document and exit
    PrintSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    macroqueue::init_tracing(args.log_level.as_deref());
    debug!(
        version = macroqueue::PKG_VERSION,
        document = %args.document.display(),
        dry_run = args.dry_run,
        "Starting macroqueue"
    );

    if matches!(args.command, Command::PrintSchema) {
        let schema = persistence::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    let mut settings = match &args.settings {
        Some(path) => cfg::load_from_path_async(path).await?,
        None => Settings::default(),
    };
    settings.dry_run |= args.dry_run;

    match args.command {
        Command::Init { force } => {
            if args.document.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    args.document.display()
                );
            }
            let engine = Engine::new(settings, Box::new(DryRunDriver::new()));
            engine.save_as(&args.document)?;
            info!(path = %args.document.display(), "Document created");
        }
        Command::Run { capture } => run(&args.document, settings, capture).await?,
        command => edit(&args.document, settings, command)?,
    }
    Ok(())
}

/// Load the document, apply one edit, save it back.
fn edit(document: &Path, settings: Settings, command: Command) -> anyhow::Result<()> {
    let engine = Engine::new(settings, Box::new(DryRunDriver::new()));
    engine
        .open(document)
        .with_context(|| format!("Failed to open {}", document.display()))?;

    match command {
        Command::Show => {
            print_workspace(&engine);
            return Ok(());
        }
        Command::AddSet => {
            let name = engine.create_set();
            println!("{name}");
        }
        Command::Rename { old, new } => engine.rename_set(&old, &new)?,
        Command::Loops { set, count } => {
            let stored = engine.set_loop_count_str(&set, &count)?;
            println!("{set}: {stored} loop(s)");
        }
        Command::Record { set, slot, x, y } => {
            engine.record_action_position(&set, slot, Position::new(x, y))?;
        }
        Command::Edit {
            set,
            slot,
            label,
            click,
            text,
            delay,
            order,
            unset_position,
        } => {
            let update = ActionUpdate {
                label,
                click_type: click,
                text,
                delay: delay.as_deref().map(parse_delay),
                order,
                position: unset_position.then_some(None),
            };
            engine.update_action(&set, slot, update)?;
        }
        Command::Clear { set, slot } => engine.clear_action(&set, slot)?,
        Command::Enqueue { set } => engine.enqueue(&set)?,
        Command::Dequeue { index } => {
            if !engine.dequeue_at(index) {
                bail!("queue has no entry at index {index}");
            }
        }
        Command::ClearQueue => engine.clear_queue(),
        other => bail!("{other:?} does not edit the document"),
    }

    engine.save()?;
    Ok(())
}

fn print_workspace(engine: &Engine) {
    let active = engine.active_set();
    for name in engine.set_names() {
        let Some(set) = engine.set(&name) else {
            continue;
        };
        let marker = if active.as_deref() == Some(name.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {name} (x{})", set.loop_count());
        for slot in set.playback_order() {
            let action = &set.actions()[slot];
            let Some(position) = action.position else {
                continue;
            };
            println!(
                "    [{slot:>2}] {:<24} {position} {:?} delay={}s order={}{}",
                action.label,
                action.click_type,
                action.delay,
                action.order,
                if action.text.is_empty() {
                    String::new()
                } else {
                    format!(" text={:?}", action.text)
                }
            );
        }
    }
    println!("queue:");
    for (index, name) in engine.queue().iter().enumerate() {
        println!("  {index}: {name}");
    }
}

async fn run(document: &Path, settings: Settings, capture: bool) -> anyhow::Result<()> {
    let driver = executor::build_driver(settings.dry_run)?;
    let engine = Engine::new(settings, driver);
    engine
        .open(document)
        .with_context(|| format!("Failed to open {}", document.display()))?;
    if capture {
        engine.toggle_capture_mode();
    }

    let mut events = engine.subscribe();
    engine.start()?;

    let (tx, mut rx) = mpsc::channel::<ControlCommand>(32);
    let sources: Vec<Box<dyn ControlSource>> = vec![Box::new(StdinSource::new())];
    let _handles = controls::spawn_all(&sources, tx);
    let mut controls_open = true;

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping");
                engine.stop();
                break RunOutcome::Stopped;
            }
            command = rx.recv(), if controls_open => match command {
                Some(ControlCommand::Quit) => {
                    engine.stop();
                    break RunOutcome::Stopped;
                }
                Some(command) => dispatch(&engine, command),
                None => controls_open = false,
            },
            event = events.recv() => match event {
                Ok(EngineEvent::Finished { outcome }) => break outcome,
                Ok(EngineEvent::ActionPerformed { set, slot, pass }) => {
                    info!(%set, slot, pass = pass + 1, "Action performed");
                }
                Ok(EngineEvent::StateChanged { paused }) => info!(paused, "Runner state changed"),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break RunOutcome::Stopped,
            },
        }
    };
    engine.wait().await;

    if capture {
        engine.save()?;
    }
    match outcome {
        RunOutcome::Failed(reason) => bail!("automation failed: {reason}"),
        outcome => {
            info!(?outcome, "macroqueue exited");
            Ok(())
        }
    }
}

fn dispatch(engine: &Engine, command: ControlCommand) {
    match command {
        ControlCommand::Pause => {
            engine.pause();
        }
        ControlCommand::Resume => {
            engine.resume();
        }
        ControlCommand::Toggle => {
            engine.toggle_pause();
        }
        ControlCommand::Stop => {
            engine.stop();
        }
        ControlCommand::Capture(slot) => match engine.capture_into(slot) {
            Ok(Some(position)) => info!(slot, %position, "Captured pointer"),
            Ok(None) => warn!("Capture mode is off (start with --capture)"),
            Err(err) => error!(error = %err, "Capture failed"),
        },
        ControlCommand::Status => {
            let cursors = engine.cursors();
            info!(
                status = ?engine.status(),
                queue = cursors.queue,
                pass = cursors.loop_pass,
                action = cursors.action,
                "Status"
            );
        }
        // Handled by the caller.
        ControlCommand::Quit => {}
    }
}
