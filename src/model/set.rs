use super::action::{Action, MAX_ACTIONS};

/// A named, fixed-capacity collection of actions plus a loop count.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSet {
    pub(crate) name: String,
    pub(crate) loop_count: u32,
    pub(crate) actions: [Action; MAX_ACTIONS],
}

impl ActionSet {
    /// A set with every slot empty and a single loop.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loop_count: 1,
            actions: std::array::from_fn(Action::empty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn actions(&self) -> &[Action; MAX_ACTIONS] {
        &self.actions
    }

    pub fn action(&self, slot: usize) -> Option<&Action> {
        self.actions.get(slot)
    }

    pub(crate) fn action_mut(&mut self, slot: usize) -> Option<&mut Action> {
        self.actions.get_mut(slot)
    }

    /// Whether at least one slot has a recorded position.
    pub fn has_recorded(&self) -> bool {
        self.actions.iter().any(Action::is_recorded)
    }

    /// Slot indices in playback order: `order` ascending, ties by slot.
    pub fn playback_order(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = (0..MAX_ACTIONS).collect();
        // sort_by_key is stable, so equal orders keep slot order
        slots.sort_by_key(|&slot| self.actions[slot].order);
        slots
    }
}

/// Clamp a requested loop count to at least one.
pub fn clamp_loop_count(count: i64) -> u32 {
    count.clamp(1, i64::from(u32::MAX)) as u32
}

/// Parse user-entered loop count text; anything unusable becomes 1.
pub fn parse_loop_count(raw: &str) -> u32 {
    raw.trim().parse::<i64>().map(clamp_loop_count).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_full_of_empty_slots() {
        let set = ActionSet::new("Set 1");
        assert_eq!(set.actions().len(), MAX_ACTIONS);
        assert_eq!(set.loop_count(), 1);
        assert!(!set.has_recorded());
        assert_eq!(set.action(19).map(|a| a.order), Some(19));
        assert!(set.action(20).is_none());
    }

    #[test]
    fn playback_order_sorts_by_order_then_slot() {
        let mut set = ActionSet::new("s");
        set.actions[0].order = 2;
        set.actions[1].order = 0;
        set.actions[2].order = 1;
        // push the untouched slots behind the interesting ones
        for slot in 3..MAX_ACTIONS {
            set.actions[slot].order = 100;
        }
        let order = set.playback_order();
        assert_eq!(&order[..3], &[1, 2, 0]);
        assert_eq!(&order[3..5], &[3, 4]);
    }

    #[test]
    fn loop_count_coercion() {
        assert_eq!(clamp_loop_count(0), 1);
        assert_eq!(clamp_loop_count(-7), 1);
        assert_eq!(clamp_loop_count(5), 5);
        assert_eq!(parse_loop_count("3"), 3);
        assert_eq!(parse_loop_count("x"), 1);
        assert_eq!(parse_loop_count(""), 1);
        assert_eq!(parse_loop_count("-2"), 1);
    }
}
