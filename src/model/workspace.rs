use tracing::{debug, warn};

use super::queue::ExecutionQueue;
use super::registry::SetRegistry;
use crate::error::RegistryError;

/// Registry and queue under one owner, so edits touching both are atomic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workspace {
    pub(crate) registry: SetRegistry,
    pub(crate) queue: ExecutionQueue,
}

impl Workspace {
    /// A fresh workspace holding one empty set and an empty queue.
    pub fn new() -> Self {
        let mut registry = SetRegistry::new();
        registry.create_set();
        Self {
            registry,
            queue: ExecutionQueue::new(),
        }
    }

    /// Assemble from decoded parts. Queue entries naming unknown sets are dropped.
    pub fn from_parts(registry: SetRegistry, queue: impl IntoIterator<Item = String>) -> Self {
        let mut ws = Self {
            registry,
            queue: ExecutionQueue::new(),
        };
        for name in queue {
            if ws.registry.contains(&name) {
                ws.queue.push(name);
            } else {
                warn!(
                    target: "macroqueue::registry",
                    set = %name,
                    "Dropping queue entry for unknown set"
                );
            }
        }
        ws
    }

    pub fn registry(&self) -> &SetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SetRegistry {
        &mut self.registry
    }

    pub fn queue(&self) -> &ExecutionQueue {
        &self.queue
    }

    /// Rename a set and every queue entry referring to it, or change nothing.
    pub fn rename_set(&mut self, old: &str, new: &str) -> Result<(), RegistryError> {
        self.registry.rename(old, new)?;
        self.queue.rename_all(old, new);
        debug!(target: "macroqueue::registry", %old, %new, "Renamed set");
        Ok(())
    }

    pub fn enqueue(&mut self, name: &str) -> Result<(), RegistryError> {
        if !self.registry.contains(name) {
            return Err(RegistryError::UnknownSet(name.to_string()));
        }
        self.queue.push(name);
        Ok(())
    }

    pub fn dequeue_at(&mut self, index: usize) -> bool {
        self.queue.remove_at(index)
    }

    /// Empty the queue; sets are untouched.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        debug!(target: "macroqueue::registry", "Cleared queue");
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionSet;

    #[test]
    fn clear_queue_keeps_sets() {
        let mut ws = Workspace::new();
        ws.enqueue("Set 1").unwrap();
        ws.enqueue("Set 1").unwrap();
        ws.clear_queue();
        assert!(ws.queue().is_empty());
        assert!(ws.registry().contains("Set 1"));
    }

    #[test]
    fn rename_updates_queue_atomically() {
        let mut ws = Workspace::new();
        let second = ws.registry_mut().create_set();
        ws.enqueue("Set 1").unwrap();
        ws.enqueue(&second).unwrap();
        ws.enqueue("Set 1").unwrap();

        ws.rename_set("Set 1", "Intro").unwrap();
        assert_eq!(ws.queue().snapshot(), vec!["Intro", "Set 2", "Intro"]);
        assert!(ws.registry().contains("Intro"));
    }

    #[test]
    fn failed_rename_leaves_queue_untouched() {
        let mut ws = Workspace::new();
        ws.registry_mut().create_set();
        ws.enqueue("Set 1").unwrap();
        let before = ws.clone();

        assert!(ws.rename_set("Set 1", "Set 2").is_err());
        assert_eq!(ws, before);
    }

    #[test]
    fn enqueue_rejects_unknown_sets() {
        let mut ws = Workspace::new();
        assert_eq!(
            ws.enqueue("ghost"),
            Err(RegistryError::UnknownSet("ghost".into()))
        );
        assert!(ws.queue().is_empty());
    }

    #[test]
    fn from_parts_drops_dangling_queue_entries() {
        let registry = SetRegistry::from_sets([ActionSet::new("a")]);
        let ws = Workspace::from_parts(registry, vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(ws.queue().snapshot(), vec!["a", "a"]);
    }
}
