//! Engine facade: the single entry point a UI or CLI drives.
//!
//! All runner transitions and workspace edits happen under one mutex, so a
//! control event (pause key, capture key) can never interleave with the
//! worker's read-modify-write of the cursors. Driver calls and delays run
//! outside that lock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{EngineError, RegistryError};
use crate::executor::runner::Worker;
use crate::executor::{
    Cursors, EngineEvent, InputDriver, RunOutcome, RunStatus, RunnerState, SharedDriver, lock,
    share,
};
use crate::model::{ActionSet, ActionUpdate, Position, Workspace, parse_loop_count};
use crate::persistence;

/// State guarded by the engine lock.
pub(crate) struct Core {
    pub(crate) workspace: Workspace,
    pub(crate) runner: RunnerState,
    cancel: Option<CancellationToken>,
    document_path: Option<PathBuf>,
    capture_mode: bool,
}

impl Core {
    /// Halt the current run and cancel its pending wait. False if already idle.
    pub(crate) fn finish_run(&mut self) -> bool {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.runner.halt()
    }
}

pub struct Engine {
    core: Arc<Mutex<Core>>,
    driver: SharedDriver,
    events: broadcast::Sender<EngineEvent>,
    settings: Settings,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Engine over a fresh workspace (one empty set, empty queue).
    pub fn new(settings: Settings, driver: Box<dyn InputDriver>) -> Self {
        Self::with_workspace(Workspace::new(), settings, driver)
    }

    pub fn with_workspace(
        workspace: Workspace,
        settings: Settings,
        driver: Box<dyn InputDriver>,
    ) -> Self {
        let (events, _) = broadcast::channel(settings.event_buffer.max(1));
        debug!(target: "macroqueue::engine", driver = driver.name(), "Engine created");
        Self {
            core: Arc::new(Mutex::new(Core {
                workspace,
                runner: RunnerState::default(),
                cancel: None,
                document_path: None,
                capture_mode: false,
            })),
            driver: share(driver),
            events,
            settings,
            worker: Mutex::new(None),
        }
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        lock(&self.core)
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // --- Workspace queries ---

    /// Copy of the whole workspace.
    pub fn workspace(&self) -> Workspace {
        self.core().workspace.clone()
    }

    pub fn set_names(&self) -> Vec<String> {
        self.core().workspace.registry().set_names()
    }

    pub fn set(&self, name: &str) -> Option<ActionSet> {
        self.core().workspace.registry().get(name).cloned()
    }

    pub fn active_set(&self) -> Option<String> {
        self.core()
            .workspace
            .registry()
            .active_set()
            .map(str::to_string)
    }

    pub fn queue(&self) -> Vec<String> {
        self.core().workspace.queue().snapshot()
    }

    // --- Workspace edits ---

    pub fn create_set(&self) -> String {
        self.core().workspace.registry_mut().create_set()
    }

    pub fn rename_set(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        self.core().workspace.rename_set(old, new)
    }

    pub fn switch_set(&self, name: &str) -> Result<(), RegistryError> {
        self.core().workspace.registry_mut().switch_set(name)?;
        self.emit(EngineEvent::RefreshRequested);
        Ok(())
    }

    /// Non-positive counts clamp to 1. Returns the stored count.
    pub fn set_loop_count(&self, name: &str, count: i64) -> Result<u32, RegistryError> {
        self.core()
            .workspace
            .registry_mut()
            .set_loop_count(name, count)
    }

    /// Like [`set_loop_count`](Self::set_loop_count) for raw user text; malformed text stores 1.
    pub fn set_loop_count_str(&self, name: &str, raw: &str) -> Result<u32, RegistryError> {
        self.set_loop_count(name, i64::from(parse_loop_count(raw)))
    }

    pub fn record_action_position(
        &self,
        name: &str,
        slot: usize,
        position: Position,
    ) -> Result<(), RegistryError> {
        self.core()
            .workspace
            .registry_mut()
            .record_action_position(name, slot, position)
    }

    /// Merge the supplied fields. Edits to the set currently playing apply on
    /// the action's next pass.
    pub fn update_action(
        &self,
        name: &str,
        slot: usize,
        update: ActionUpdate,
    ) -> Result<(), RegistryError> {
        self.core()
            .workspace
            .registry_mut()
            .update_action(name, slot, update)
    }

    pub fn clear_action(&self, name: &str, slot: usize) -> Result<(), RegistryError> {
        self.core().workspace.registry_mut().clear_action(name, slot)
    }

    pub fn enqueue(&self, name: &str) -> Result<(), RegistryError> {
        self.core().workspace.enqueue(name)
    }

    /// Remove a queue entry. Removing the entry that is playing stops the run;
    /// removing an earlier one keeps the cursor on the same set.
    pub fn dequeue_at(&self, index: usize) -> bool {
        let stopped = {
            let mut core = self.core();
            if !core.workspace.dequeue_at(index) {
                return false;
            }
            let cursor = core.runner.cursors().queue;
            if !core.runner.is_active() {
                false
            } else if index == cursor {
                core.finish_run()
            } else {
                if index < cursor {
                    core.runner.shift_queue_back();
                }
                false
            }
        };
        if stopped {
            warn!(target: "macroqueue::engine", index, "Playing queue entry removed; automation stopped");
            self.emit(EngineEvent::StateChanged { paused: false });
            self.emit(EngineEvent::Finished {
                outcome: RunOutcome::Stopped,
            });
        }
        true
    }

    /// Stop any run, then empty the queue.
    pub fn clear_queue(&self) {
        self.stop();
        self.core().workspace.clear_queue();
        self.emit(EngineEvent::RefreshRequested);
    }

    // --- Runner control ---

    pub fn status(&self) -> RunStatus {
        self.core().runner.status()
    }

    pub fn cursors(&self) -> Cursors {
        self.core().runner.cursors()
    }

    pub fn is_running(&self) -> bool {
        self.core().runner.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.status() == RunStatus::Paused
    }

    /// Begin playing the queue on a background task. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self) -> Result<(), EngineError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (run_id, cancel, queued) = {
            let mut core = self.core();
            if core.runner.is_active() {
                return Err(EngineError::AlreadyRunning);
            }
            let queued = core.workspace.queue().len();
            if queued == 0 {
                return Err(EngineError::EmptyQueue);
            }
            let run_id = core.runner.begin();
            let cancel = CancellationToken::new();
            core.cancel = Some(cancel.clone());
            (run_id, cancel, queued)
        };
        info!(target: "macroqueue::engine", run_id, queued, "Starting automation");

        let worker = Worker {
            core: Arc::clone(&self.core),
            driver: Arc::clone(&self.driver),
            events: self.events.clone(),
            settings: self.settings.clone(),
            cancel,
            run_id,
        };
        // A previous worker that is still winding down exits on its own.
        *lock(&self.worker) = Some(runtime.spawn(worker.run()));
        Ok(())
    }

    /// Pause playback. Returns false (and changes nothing) unless running.
    ///
    /// A pause requested during an action's delay lets that delay run out, but
    /// the next action does not fire until [`resume`](Self::resume).
    pub fn pause(&self) -> bool {
        let paused = self.core().runner.pause();
        if paused {
            info!(target: "macroqueue::engine", "Automation paused");
            self.emit(EngineEvent::StateChanged { paused: true });
        }
        paused
    }

    /// Resume playback. Returns false (and changes nothing) unless paused.
    pub fn resume(&self) -> bool {
        let resumed = self.core().runner.resume();
        if resumed {
            info!(target: "macroqueue::engine", "Automation resumed");
            self.emit(EngineEvent::StateChanged { paused: false });
        }
        resumed
    }

    /// Pause if running, resume if paused. Returns the resulting paused flag.
    pub fn toggle_pause(&self) -> bool {
        let status = self.status();
        match status {
            RunStatus::Running => self.pause(),
            RunStatus::Paused => !self.resume(),
            RunStatus::Idle => false,
        }
    }

    /// Stop playback immediately. Any pending delay is cancelled.
    pub fn stop(&self) -> bool {
        let stopped = self.core().finish_run();
        if stopped {
            info!(target: "macroqueue::engine", "Automation stopped");
            self.emit(EngineEvent::StateChanged { paused: false });
            self.emit(EngineEvent::Finished {
                outcome: RunOutcome::Stopped,
            });
        }
        stopped
    }

    /// Wait for the most recently started worker to exit.
    pub async fn wait(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(target: "macroqueue::engine", error = %err, "Worker task ended abnormally");
                self.core().finish_run();
            }
        }
    }

    // --- Pointer capture ---

    /// Flip capture mode; returns the new value.
    pub fn toggle_capture_mode(&self) -> bool {
        let mut core = self.core();
        core.capture_mode = !core.capture_mode;
        debug!(target: "macroqueue::engine", active = core.capture_mode, "Capture mode toggled");
        core.capture_mode
    }

    pub fn capture_mode(&self) -> bool {
        self.core().capture_mode
    }

    fn pointer_position(&self) -> Result<Position, EngineError> {
        lock(&self.driver)
            .current_pointer_position()
            .map_err(EngineError::Driver)
    }

    /// Read the pointer while capture mode is active. `None` when inactive.
    pub fn capture_pointer(&self) -> Result<Option<Position>, EngineError> {
        if !self.capture_mode() {
            return Ok(None);
        }
        let position = self.pointer_position()?;
        self.emit(EngineEvent::CoordinateCaptured { position });
        Ok(Some(position))
    }

    /// Record the pointer into `slot` of the active set while capture mode is active.
    pub fn capture_into(&self, slot: usize) -> Result<Option<Position>, EngineError> {
        let Some(position) = self.capture_pointer()? else {
            return Ok(None);
        };
        {
            let mut core = self.core();
            let registry = core.workspace.registry_mut();
            let name = registry
                .active_set()
                .map(str::to_string)
                .ok_or(RegistryError::NoActiveSet)?;
            registry.record_action_position(&name, slot, position)?;
        }
        self.emit(EngineEvent::RefreshRequested);
        Ok(Some(position))
    }

    /// Move the pointer to a recorded slot. Returns false if the slot is empty.
    pub fn goto_action(&self, name: &str, slot: usize) -> Result<bool, EngineError> {
        let position = {
            let core = self.core();
            let set = core
                .workspace
                .registry()
                .get(name)
                .ok_or_else(|| RegistryError::UnknownSet(name.to_string()))?;
            set.action(slot)
                .ok_or(RegistryError::SlotOutOfRange {
                    slot,
                    capacity: crate::model::MAX_ACTIONS,
                })?
                .position
        };
        let Some(position) = position else {
            return Ok(false);
        };
        lock(&self.driver)
            .move_pointer(position)
            .map_err(EngineError::Driver)?;
        Ok(true)
    }

    // --- Documents ---

    pub fn document_path(&self) -> Option<PathBuf> {
        self.core().document_path.clone()
    }

    /// Stop playback and start over with one empty set.
    pub fn new_document(&self) {
        self.stop();
        {
            let mut core = self.core();
            core.workspace.reset();
            core.document_path = None;
            core.capture_mode = false;
        }
        self.emit(EngineEvent::RefreshRequested);
    }

    /// Replace the workspace with a document from disk. On failure nothing changes
    /// except that playback is stopped.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.stop();
        let path = path.as_ref();
        let workspace = persistence::load_from_path(path)?;
        {
            let mut core = self.core();
            core.workspace = workspace;
            core.document_path = Some(path.to_path_buf());
            core.capture_mode = false;
        }
        info!(target: "macroqueue::engine", path = %path.display(), "Document opened");
        self.emit(EngineEvent::RefreshRequested);
        Ok(())
    }

    /// Save to the current document path.
    pub fn save(&self) -> Result<(), EngineError> {
        let path = self.document_path().ok_or(EngineError::NoDocumentPath)?;
        self.save_as(path)
    }

    /// Save to `path` and make it the current document path.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        let workspace = self.workspace();
        persistence::save_to_path(&workspace, path)?;
        self.core().document_path = Some(path.to_path_buf());
        info!(target: "macroqueue::engine", path = %path.display(), "Document saved");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Never leave a worker clicking after its engine is gone.
        self.core().finish_run();
    }
}
