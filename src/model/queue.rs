/// Ordered playlist of set names. The same set may appear several times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionQueue {
    entries: Vec<String>,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>) {
        self.entries.push(name.into());
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove the entry at `index`. Returns false when out of range.
    pub(crate) fn remove_at(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.entries.remove(index);
            true
        } else {
            false
        }
    }

    pub(crate) fn rename_all(&mut self, old: &str, new: &str) {
        for entry in self.entries.iter_mut().filter(|e| e.as_str() == old) {
            *entry = new.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_and_removal() {
        let mut q = ExecutionQueue::new();
        q.push("a");
        q.push("b");
        q.push("a");
        assert_eq!(q.snapshot(), vec!["a", "b", "a"]);

        assert!(!q.remove_at(3));
        assert!(q.remove_at(0));
        assert_eq!(q.snapshot(), vec!["b", "a"]);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut q = ExecutionQueue::new();
        q.push("a");
        let snap = q.snapshot();
        q.push("b");
        assert_eq!(snap, vec!["a"]);
    }

    #[test]
    fn rename_all_rewrites_every_occurrence() {
        let mut q = ExecutionQueue::new();
        q.push("a");
        q.push("b");
        q.push("a");
        q.rename_all("a", "z");
        assert_eq!(q.snapshot(), vec!["z", "b", "z"]);
    }
}
