use tracing::debug;

use super::action::{Action, ActionUpdate, MAX_ACTIONS, Position, default_label, recorded_label};
use super::set::{ActionSet, clamp_loop_count};
use crate::error::RegistryError;

/// Owns every set, keyed by unique name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetRegistry {
    sets: Vec<ActionSet>,
    active: Option<String>,
}

impl SetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-constructed sets (duplicates by name keep the first).
    pub fn from_sets(sets: impl IntoIterator<Item = ActionSet>) -> Self {
        let mut registry = Self::new();
        for set in sets {
            if registry.contains(&set.name) {
                continue;
            }
            registry.sets.push(set);
        }
        registry.active = registry.sets.first().map(|s| s.name.clone());
        registry
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.iter().any(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ActionSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut ActionSet, RegistryError> {
        self.sets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::UnknownSet(name.to_string()))
    }

    pub fn sets(&self) -> impl Iterator<Item = &ActionSet> {
        self.sets.iter()
    }

    pub fn set_names(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn active_set(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn switch_set(&mut self, name: &str) -> Result<(), RegistryError> {
        if !self.contains(name) {
            return Err(RegistryError::UnknownSet(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Allocate `Set <n>` with n = count + 1, skipping names already taken.
    pub fn create_set(&mut self) -> String {
        let mut n = self.sets.len() + 1;
        let name = loop {
            let candidate = format!("Set {n}");
            if !self.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.sets.push(ActionSet::new(name.clone()));
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        debug!(target: "macroqueue::registry", set = %name, "Created set");
        name
    }

    /// Rename in place. Only the registry side; queue references are
    /// rewritten by [`Workspace::rename_set`](super::Workspace::rename_set).
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> Result<(), RegistryError> {
        if new.trim().is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if !self.contains(old) {
            return Err(RegistryError::UnknownSet(old.to_string()));
        }
        if self.contains(new) {
            return Err(RegistryError::NameTaken(new.to_string()));
        }
        self.get_mut(old)?.name = new.to_string();
        if self.active.as_deref() == Some(old) {
            self.active = Some(new.to_string());
        }
        Ok(())
    }

    /// Non-positive counts clamp to 1. Returns the stored count.
    pub fn set_loop_count(&mut self, name: &str, count: i64) -> Result<u32, RegistryError> {
        let set = self.get_mut(name)?;
        set.loop_count = clamp_loop_count(count);
        Ok(set.loop_count)
    }

    pub fn record_action_position(
        &mut self,
        name: &str,
        slot: usize,
        position: Position,
    ) -> Result<(), RegistryError> {
        let action = self.slot_mut(name, slot)?;
        action.position = Some(position);
        if action.label == default_label(slot) {
            action.label = recorded_label(slot, position);
        }
        debug!(target: "macroqueue::registry", set = %name, slot, %position, "Recorded position");
        Ok(())
    }

    pub fn update_action(
        &mut self,
        name: &str,
        slot: usize,
        update: ActionUpdate,
    ) -> Result<(), RegistryError> {
        update.apply_to(self.slot_mut(name, slot)?);
        Ok(())
    }

    pub fn clear_action(&mut self, name: &str, slot: usize) -> Result<(), RegistryError> {
        *self.slot_mut(name, slot)? = Action::empty(slot);
        Ok(())
    }

    fn slot_mut(&mut self, name: &str, slot: usize) -> Result<&mut Action, RegistryError> {
        self.get_mut(name)?
            .action_mut(slot)
            .ok_or(RegistryError::SlotOutOfRange {
                slot,
                capacity: MAX_ACTIONS,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_set_names_and_activation() {
        let mut reg = SetRegistry::new();
        assert_eq!(reg.create_set(), "Set 1");
        assert_eq!(reg.create_set(), "Set 2");
        assert_eq!(reg.active_set(), Some("Set 1"));
        assert_eq!(reg.set_names(), vec!["Set 1", "Set 2"]);
    }

    #[test]
    fn create_set_skips_taken_default_name() {
        let mut reg = SetRegistry::new();
        reg.create_set();
        reg.create_set();
        reg.rename("Set 1", "Set 3").unwrap();
        // count is 2, so "Set 3" is the first candidate but it is taken
        assert_eq!(reg.create_set(), "Set 4");
    }

    #[test]
    fn rename_rules() {
        let mut reg = SetRegistry::new();
        reg.create_set();
        reg.create_set();
        assert_eq!(
            reg.rename("Set 1", "Set 2"),
            Err(RegistryError::NameTaken("Set 2".into()))
        );
        assert_eq!(
            reg.rename("nope", "x"),
            Err(RegistryError::UnknownSet("nope".into()))
        );
        assert_eq!(reg.rename("Set 1", "  "), Err(RegistryError::InvalidName));

        reg.rename("Set 1", "Login").unwrap();
        assert_eq!(reg.set_names(), vec!["Login", "Set 2"]);
        assert_eq!(reg.active_set(), Some("Login"));
    }

    #[test]
    fn record_position_upgrades_default_label_once() {
        let mut reg = SetRegistry::new();
        let name = reg.create_set();
        reg.record_action_position(&name, 2, Position::new(5, 6)).unwrap();
        let label = reg.get(&name).unwrap().action(2).unwrap().label.clone();
        assert_eq!(label, "Point 3: (5, 6)");

        reg.record_action_position(&name, 2, Position::new(7, 8)).unwrap();
        let action = reg.get(&name).unwrap().action(2).unwrap();
        assert_eq!(action.label, "Point 3: (5, 6)");
        assert_eq!(action.position, Some(Position::new(7, 8)));
    }

    #[test]
    fn slot_count_is_invariant() {
        let mut reg = SetRegistry::new();
        let name = reg.create_set();
        reg.record_action_position(&name, 19, Position::new(1, 1)).unwrap();
        assert_eq!(
            reg.record_action_position(&name, 20, Position::new(1, 1)),
            Err(RegistryError::SlotOutOfRange {
                slot: 20,
                capacity: MAX_ACTIONS
            })
        );
        assert_eq!(reg.get(&name).unwrap().actions().len(), MAX_ACTIONS);
    }

    #[test]
    fn unknown_set_operations_fail_softly() {
        let mut reg = SetRegistry::new();
        assert!(reg.set_loop_count("ghost", 3).is_err());
        assert!(reg.clear_action("ghost", 0).is_err());
        assert!(reg.switch_set("ghost").is_err());
        assert!(
            reg.update_action("ghost", 0, ActionUpdate::default())
                .is_err()
        );
    }

    #[test]
    fn loop_count_clamps_silently() {
        let mut reg = SetRegistry::new();
        let name = reg.create_set();
        assert_eq!(reg.set_loop_count(&name, 0), Ok(1));
        assert_eq!(reg.set_loop_count(&name, 4), Ok(4));
        assert_eq!(reg.get(&name).unwrap().loop_count(), 4);
    }
}
