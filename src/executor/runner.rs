use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::events::{EngineEvent, RunOutcome};
use super::state::{PlannedAction, RunStatus, Step};
use super::{SharedDriver, lock};
use crate::config::Settings;
use crate::engine::Core;

/// Background playback task. One exists per run; it exits as soon as its run
/// is no longer the current one.
pub(crate) struct Worker {
    pub(crate) core: Arc<Mutex<Core>>,
    pub(crate) driver: SharedDriver,
    pub(crate) events: broadcast::Sender<EngineEvent>,
    pub(crate) settings: Settings,
    pub(crate) cancel: CancellationToken,
    pub(crate) run_id: u64,
}

enum Next {
    Paused,
    Step(Step),
}

/// Ends the run as failed if the worker unwinds, so the runner never stays
/// `Running` without a task behind it.
struct FinishOnPanic<'a>(&'a Worker);

impl Drop for FinishOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0
                .finish(RunOutcome::Failed("playback worker panicked".to_string()));
        }
    }
}

impl Worker {
    pub(crate) async fn run(self) {
        info!(target: "macroqueue::runner", run_id = self.run_id, "Worker started");
        let _finish_on_panic = FinishOnPanic(&self);
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let next = {
                let mut guard = lock(&self.core);
                let core = &mut *guard;
                if !core.runner.owns(self.run_id) {
                    break;
                }
                if core.runner.status() == RunStatus::Paused {
                    Next::Paused
                } else {
                    Next::Step(core.runner.next_step(&core.workspace))
                }
            };

            match next {
                Next::Paused => {
                    if !self.wait(self.settings.pause_poll()).await {
                        break;
                    }
                }
                Next::Step(Step::Finished) => {
                    self.finish(RunOutcome::Completed);
                    break;
                }
                Next::Step(Step::Perform(planned)) => {
                    if let Err(err) = self.perform(&planned).await {
                        error!(
                            target: "macroqueue::runner",
                            set = %planned.set, slot = planned.slot, error = %format!("{err:#}"),
                            "Input driver failed; stopping automation"
                        );
                        self.finish(RunOutcome::Failed(format!("{err:#}")));
                        break;
                    }
                    let _ = self.events.send(EngineEvent::ActionPerformed {
                        set: planned.set.clone(),
                        slot: planned.slot,
                        pass: planned.pass,
                    });

                    let delay = self.settings.pace(planned.action.delay);
                    trace!(target: "macroqueue::runner", ?delay, "Waiting after action");
                    if !self.wait(delay).await {
                        break;
                    }

                    let mut core = lock(&self.core);
                    if !core.runner.owns(self.run_id) {
                        break;
                    }
                    core.runner.complete_action();
                }
            }
        }
        debug!(target: "macroqueue::runner", run_id = self.run_id, "Worker exited");
    }

    /// Fire one action. Runs outside the engine lock, on the blocking pool since
    /// drivers may block on OS input.
    async fn perform(&self, planned: &PlannedAction) -> Result<()> {
        let Some(position) = planned.action.position else {
            return Ok(());
        };
        debug!(
            target: "macroqueue::runner",
            set = %planned.set, slot = planned.slot, pass = planned.pass,
            %position, click = ?planned.action.click_type,
            "Performing action"
        );
        let driver = Arc::clone(&self.driver);
        let click = planned.action.click_type;
        let text = planned.action.text.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut driver = lock(&driver);
            driver.move_and_click(position, click)?;
            if !text.is_empty() {
                driver.type_text(&text)?;
            }
            Ok(())
        })
        .await
        .map_err(|err| anyhow!("input driver task failed: {err}"))?
    }

    /// Sleep unless cancelled first. Returns false when cancelled.
    async fn wait(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    fn finish(&self, outcome: RunOutcome) {
        let halted = {
            let mut core = lock(&self.core);
            core.runner.owns(self.run_id) && core.finish_run()
        };
        if halted {
            info!(target: "macroqueue::runner", ?outcome, "Automation finished");
            let _ = self.events.send(EngineEvent::StateChanged { paused: false });
            let _ = self.events.send(EngineEvent::Finished { outcome });
        }
    }
}
