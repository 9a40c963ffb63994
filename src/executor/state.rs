use crate::model::{Action, Workspace};

/// Lifecycle of the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Playback position inside the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursors {
    /// Index into the execution queue.
    pub queue: usize,
    /// Completed passes over the current set.
    pub loop_pass: u32,
    /// Index into the current set's playback order.
    pub action: usize,
}

/// What the worker should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Perform(PlannedAction),
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
    pub set: String,
    pub slot: usize,
    pub pass: u32,
    pub action: Action,
}

/// Runner state. Only mutated under the engine lock.
#[derive(Debug, Default)]
pub struct RunnerState {
    status: RunStatus,
    cursors: Cursors,
    run_id: u64,
}

impl RunnerState {
    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn cursors(&self) -> Cursors {
        self.cursors
    }

    pub fn is_active(&self) -> bool {
        self.status != RunStatus::Idle
    }

    /// Enter `Running` with fresh cursors; returns the id of the new run.
    pub(crate) fn begin(&mut self) -> u64 {
        self.run_id = self.run_id.wrapping_add(1);
        self.status = RunStatus::Running;
        self.cursors = Cursors::default();
        self.run_id
    }

    /// Back to `Idle` with cursors reset. Returns false if already idle.
    pub(crate) fn halt(&mut self) -> bool {
        let was_active = self.is_active();
        self.status = RunStatus::Idle;
        self.cursors = Cursors::default();
        was_active
    }

    pub(crate) fn pause(&mut self) -> bool {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Paused;
            true
        } else {
            false
        }
    }

    pub(crate) fn resume(&mut self) -> bool {
        if self.status == RunStatus::Paused {
            self.status = RunStatus::Running;
            true
        } else {
            false
        }
    }

    /// Whether the worker of `run_id` may still drive this state.
    pub(crate) fn owns(&self, run_id: u64) -> bool {
        self.run_id == run_id && self.is_active()
    }

    /// An earlier queue entry was removed; keep pointing at the same set.
    pub(crate) fn shift_queue_back(&mut self) {
        self.cursors.queue = self.cursors.queue.saturating_sub(1);
    }

    /// Move past the action returned by the last [`next_step`](Self::next_step).
    pub(crate) fn complete_action(&mut self) {
        self.cursors.action += 1;
    }

    fn next_queue_entry(&mut self) {
        self.cursors.queue += 1;
        self.cursors.loop_pass = 0;
        self.cursors.action = 0;
    }

    /// Advance the cursors past everything that needs no input and return the
    /// next action to fire, or `Finished` once the queue is exhausted.
    ///
    /// The returned action is not consumed; call `complete_action` after its delay.
    pub(crate) fn next_step(&mut self, workspace: &Workspace) -> Step {
        loop {
            let Some(name) = workspace.queue().get(self.cursors.queue) else {
                return Step::Finished;
            };
            let Some(set) = workspace
                .registry()
                .get(name)
                .filter(|set| set.has_recorded())
            else {
                self.next_queue_entry();
                continue;
            };
            if self.cursors.loop_pass >= set.loop_count() {
                self.next_queue_entry();
                continue;
            }
            let order = set.playback_order();
            let Some(&slot) = order.get(self.cursors.action) else {
                self.cursors.loop_pass += 1;
                self.cursors.action = 0;
                continue;
            };
            let action = &set.actions()[slot];
            if !action.is_recorded() {
                self.cursors.action += 1;
                continue;
            }
            return Step::Perform(PlannedAction {
                set: set.name().to_string(),
                slot,
                pass: self.cursors.loop_pass,
                action: action.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionUpdate, Position};

    fn drain(state: &mut RunnerState, ws: &Workspace) -> Vec<(String, usize, u32)> {
        let mut out = Vec::new();
        while let Step::Perform(p) = state.next_step(ws) {
            out.push((p.set, p.slot, p.pass));
            state.complete_action();
        }
        out
    }

    #[test]
    fn transitions() {
        let mut s = RunnerState::default();
        assert!(!s.pause());
        assert!(!s.resume());
        let id = s.begin();
        assert!(s.owns(id));
        assert!(s.pause());
        assert!(!s.pause());
        assert_eq!(s.status(), RunStatus::Paused);
        assert!(s.resume());
        assert!(s.halt());
        assert!(!s.halt());
        assert!(!s.owns(id));
        let next = s.begin();
        assert!(!s.owns(id));
        assert!(s.owns(next));
    }

    #[test]
    fn visits_slots_by_order_field() {
        let mut ws = Workspace::new();
        let reg = ws.registry_mut();
        for (slot, order) in [(0, 2), (1, 0), (2, 1)] {
            reg.record_action_position("Set 1", slot, Position::new(slot as i32, 0))
                .unwrap();
            reg.update_action(
                "Set 1",
                slot,
                ActionUpdate {
                    order: Some(order),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        ws.enqueue("Set 1").unwrap();

        let mut state = RunnerState::default();
        state.begin();
        let slots: Vec<usize> = drain(&mut state, &ws).into_iter().map(|v| v.1).collect();
        assert_eq!(slots, vec![1, 2, 0]);
    }

    #[test]
    fn loops_and_skips_unrecorded_sets() {
        let mut ws = Workspace::new();
        let empty = ws.registry_mut().create_set();
        ws.registry_mut()
            .record_action_position("Set 1", 5, Position::new(1, 1))
            .unwrap();
        ws.registry_mut().set_loop_count("Set 1", 3).unwrap();
        ws.enqueue(&empty).unwrap();
        ws.enqueue("Set 1").unwrap();
        ws.enqueue(&empty).unwrap();

        let mut state = RunnerState::default();
        state.begin();
        let steps = drain(&mut state, &ws);
        assert_eq!(
            steps,
            vec![
                ("Set 1".to_string(), 5, 0),
                ("Set 1".to_string(), 5, 1),
                ("Set 1".to_string(), 5, 2),
            ]
        );
        assert_eq!(state.cursors().queue, 3);
    }

    #[test]
    fn empty_queue_finishes_immediately() {
        let ws = Workspace::new();
        let mut state = RunnerState::default();
        state.begin();
        assert_eq!(state.next_step(&ws), Step::Finished);
    }
}
