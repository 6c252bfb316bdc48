use std::collections::VecDeque;

use tracing::trace;

use crate::buffer::BufferSnapshot;

/// Linear undo/redo history.
///
/// A change is bracketed by [`History::begin`] and [`History::commit`]: the
/// snapshot taken at `begin` becomes one undo step if the text actually
/// changed by `commit`. Nested `begin` calls keep the outermost snapshot, so
/// an Insert session or a replayed `.` is a single step.
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<BufferSnapshot>,
    redo_stack: Vec<BufferSnapshot>,
    pending: Option<BufferSnapshot>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            pending: None,
            max_depth,
        }
    }

    pub fn begin(&mut self, before: BufferSnapshot) {
        if self.pending.is_none() {
            self.pending = Some(before);
        }
    }

    pub fn in_change(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the open change. Returns true if an undo step was recorded.
    pub fn commit(&mut self, after: &BufferSnapshot) -> bool {
        match self.pending.take() {
            Some(before) if before.text != after.text => {
                self.push(before);
                true
            }
            _ => false,
        }
    }

    /// Record a snapshot taken before an edit. Clears the redo stack.
    pub fn push(&mut self, snapshot: BufferSnapshot) {
        self.redo_stack.clear();
        self.undo_stack.push_back(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        trace!(depth = self.undo_stack.len(), "undo step recorded");
    }

    /// Step back. `current` is kept for redo.
    pub fn undo(&mut self, current: BufferSnapshot) -> Option<BufferSnapshot> {
        let snapshot = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Step forward. `current` is kept for undo.
    pub fn redo(&mut self, current: BufferSnapshot) -> Option<BufferSnapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Position;

    fn snapshot(text: &str) -> BufferSnapshot {
        BufferSnapshot {
            text: text.to_string(),
            cursor: Position::default(),
        }
    }

    #[test]
    fn test_undo_redo() {
        let mut h = History::new(100);
        h.begin(snapshot("hello"));
        assert!(h.commit(&snapshot("hello world")));

        let undone = h.undo(snapshot("hello world")).unwrap();
        assert_eq!(undone.text, "hello");

        let redone = h.redo(snapshot("hello")).unwrap();
        assert_eq!(redone.text, "hello world");
        assert!(!h.can_redo());
    }

    #[test]
    fn test_unchanged_text_records_nothing() {
        let mut h = History::new(100);
        h.begin(snapshot("same"));
        assert!(!h.commit(&snapshot("same")));
        assert!(!h.can_undo());
    }

    #[test]
    fn test_nested_begin_keeps_outermost() {
        let mut h = History::new(100);
        h.begin(snapshot("a"));
        h.begin(snapshot("ab"));
        assert!(h.commit(&snapshot("abc")));
        assert_eq!(h.undo(snapshot("abc")).unwrap().text, "a");
        assert!(!h.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut h = History::new(100);
        h.push(snapshot("a"));
        h.push(snapshot("b"));
        let _ = h.undo(snapshot("c"));
        assert!(h.can_redo());
        h.push(snapshot("d"));
        assert!(!h.can_redo());
    }

    #[test]
    fn test_max_depth() {
        let mut h = History::new(3);
        for text in ["a", "b", "c", "d"] {
            h.push(snapshot(text));
        }
        assert_eq!(h.undo_stack.len(), 3);
        assert_eq!(h.undo_stack.front().unwrap().text, "b");
    }
}
