//! Undo/redo history
//!
//! Bounded stacks of [`Snapshot`]s. Snapshots carry content only, so a
//! restored state is always recomputed from scratch by the caller.

use crate::Snapshot;
use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_UNDO_CAPACITY: usize = 50;

/// Undo and redo stacks with a bounded undo depth
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    capacity: usize,
}

impl HistoryManager {
    /// Create an empty history keeping at most `capacity` undo steps
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record the state before a mutation
    ///
    /// The oldest entry is evicted once the capacity is reached, and any
    /// redo history is discarded.
    pub fn push_undo(&mut self, snapshot: Snapshot) {
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    /// Step back: `current` moves to the redo stack and the previous state
    /// is returned for the caller to restore
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(current);
        Some(next)
    }

    /// Check if there is anything to undo
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if there is anything to redo
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo steps held
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps held
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Maximum number of undo steps
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(rows: u32) -> Snapshot {
        Snapshot {
            rows,
            cols: 1,
            cells: Vec::new(),
        }
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = HistoryManager::default();
        history.push_undo(snapshot(1));

        assert_eq!(history.undo(snapshot(2)), Some(snapshot(1)));
        assert!(!history.can_undo());
        assert_eq!(history.redo(snapshot(1)), Some(snapshot(2)));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_history() {
        let mut history = HistoryManager::default();
        assert_eq!(history.undo(snapshot(1)), None);
        assert_eq!(history.redo(snapshot(1)), None);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = HistoryManager::default();
        history.push_undo(snapshot(1));
        history.undo(snapshot(2));
        assert!(history.can_redo());

        history.push_undo(snapshot(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryManager::default();
        for rows in 1..=60 {
            history.push_undo(snapshot(rows));
        }
        assert_eq!(history.undo_len(), DEFAULT_UNDO_CAPACITY);

        let mut current = snapshot(61);
        let mut last = 0;
        while let Some(previous) = history.undo(current.clone()) {
            last = previous.rows;
            current = previous;
        }
        assert_eq!(last, 11);
    }
}
