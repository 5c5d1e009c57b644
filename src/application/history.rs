//! Bounded undo/redo history of content snapshots.

use std::collections::VecDeque;

use tracing::debug;

/// Linear history with a cursor.
///
/// `0 <= cursor < len` always holds and the entry under the cursor is the one
/// being displayed. Committing after an undo discards the redo branch.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
    capacity: usize,
}

impl<T: Clone> History<T> {
    /// Start a history holding `initial`. A capacity of zero is treated as one.
    pub fn new(initial: T, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            capacity,
        }
    }

    pub fn commit(&mut self, snapshot: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        debug!(
            history_len = self.entries.len(),
            history_cursor = self.cursor,
            "History snapshot committed"
        );
    }

    /// Step back one entry. `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = History::new("initial", 20);
        history.commit("a");
        history.commit("b");

        assert_eq!(history.undo(), Some(&"a"));
        history.commit("c");

        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), &"c");
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some(&"a"));
        assert_eq!(history.undo(), Some(&"initial"));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn capacity_evicts_oldest_entries() {
        let capacity = 20;
        let mut history = History::new(0, capacity);
        for value in 1..=capacity + 5 {
            history.commit(value);
        }

        assert_eq!(history.len(), capacity);
        assert_eq!(history.cursor(), capacity - 1);
        assert_eq!(history.current(), &(capacity + 5));
        assert!(!history.can_redo());

        let mut oldest = *history.current();
        while let Some(value) = history.undo() {
            oldest = *value;
        }
        assert_eq!(oldest, 6);
    }

    #[test]
    fn undo_and_redo_walk_the_cursor() {
        let mut history = History::new(1, 5);
        assert!(!history.can_undo());
        history.commit(2);
        history.commit(3);

        assert_eq!(history.undo(), Some(&2));
        assert!(history.can_redo());
        assert_eq!(history.redo(), Some(&3));
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), &3);
    }

    #[test]
    fn reset_keeps_only_the_new_initial_entry() {
        let mut history = History::new("a", 3);
        history.commit("b");
        history.reset("z");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), &"z");
        assert!(!history.can_undo());
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let mut history = History::new(1, 0);
        history.commit(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), &2);
    }
}
