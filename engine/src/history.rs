use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct HistoryEntry<T> {
    pub label: String,
    pub state: T,
}

/// Snapshot history. The newest undo entry always mirrors the live state,
/// so undo needs at least two entries to have somewhere to go back to.
#[derive(Clone, Debug)]
pub struct History<T> {
    undo_stack: VecDeque<HistoryEntry<T>>,
    redo_stack: Vec<HistoryEntry<T>>,
    capacity: usize,
}

impl<T: Clone> History<T> {
    pub fn new(capacity: usize) -> Self {
        History {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Drops everything and seeds the history with `state`.
    pub fn reset(&mut self, label: &str, state: T) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.push(label, state);
    }

    pub fn push(&mut self, label: &str, state: T) {
        self.undo_stack.push_back(HistoryEntry { label: label.to_string(), state });
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Moves the newest entry onto the redo stack and returns the state to
    /// restore.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        let current = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        self.undo_stack.back().map(|e| &e.state)
    }

    pub fn redo(&mut self) -> Option<&T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(next);
        self.undo_stack.back().map(|e| &e.state)
    }

    pub fn current(&self) -> Option<&T> {
        self.undo_stack.back().map(|e| &e.state)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
