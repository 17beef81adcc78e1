use std::collections::VecDeque;

use crate::models::{Company, Item};

/// Default number of undo snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded stack of full company-collection snapshots.
///
/// Pushing beyond capacity evicts the oldest snapshot.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Vec<Company>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: Vec<Company>) {
        if self.capacity == 0 {
            return;
        }
        while self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Removes and returns the most recent snapshot
    pub fn pop(&mut self) -> Option<Vec<Company>> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Single-slot item clipboard. Holds an independent copy of the item.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<Item>,
}

impl Clipboard {
    pub fn copy(&mut self, item: &Item) {
        self.slot = Some(item.clone());
    }

    pub fn get(&self) -> Option<&Item> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: u64) -> Vec<Company> {
        vec![Company::new(n, format!("C{}", n))]
    }

    #[test]
    fn test_pop_is_lifo() {
        let mut history = History::new(5);
        history.push(snapshot(1));
        history.push(snapshot(2));
        assert_eq!(history.pop(), Some(snapshot(2)));
        assert_eq!(history.pop(), Some(snapshot(1)));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut history = History::new(3);
        for n in 1..=5 {
            history.push(snapshot(n));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.pop(), Some(snapshot(5)));
        assert_eq!(history.pop(), Some(snapshot(4)));
        assert_eq!(history.pop(), Some(snapshot(3)));
        assert!(history.is_empty());
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut history = History::default();
        for n in 0..60 {
            history.push(snapshot(n));
        }
        assert_eq!(history.capacity(), 50);
        assert_eq!(history.len(), 50);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = History::new(0);
        history.push(snapshot(1));
        assert!(history.is_empty());
    }

    #[test]
    fn test_clipboard_holds_independent_copy() {
        let mut original = Item::new("Kettle");
        let mut clipboard = Clipboard::default();
        assert!(clipboard.is_empty());

        clipboard.copy(&original);
        original.description = "Changed".to_string();

        assert_eq!(clipboard.get().map(|i| i.description.as_str()), Some("Kettle"));
        clipboard.clear();
        assert!(clipboard.get().is_none());
    }
}
