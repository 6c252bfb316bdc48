//! The text buffer adapter.
//!
//! [`TextBuffer`] is the boundary between the engine and whatever actually
//! stores the document. Positions are `(line, column)` pairs, both 0-indexed,
//! with columns counted in characters. Insertion puts text before the given
//! position and keeps everything after it.

use std::path::{Path, PathBuf};

/// A `(line, column)` location in a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open span of text: `start` is included, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    /// Build a range from two positions in either order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Buffer contents and cursor, captured for undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    pub text: String,
    pub cursor: Position,
}

/// Position reached after inserting `text` at `pos`.
pub fn advance(pos: Position, text: &str) -> Position {
    match text.rfind('\n') {
        Some(idx) => Position::new(
            pos.line + text.matches('\n').count(),
            text[idx + 1..].chars().count(),
        ),
        None => Position::new(pos.line, pos.column + text.chars().count()),
    }
}

/// Byte offset of the `column`th character of `line`, clamped to its end.
pub(crate) fn byte_offset(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(idx, _)| idx)
}

/// Operations the engine needs from a document.
///
/// Hosts implement the required methods; everything else is derived.
/// Out-of-range positions are clamped rather than rejected.
pub trait TextBuffer: Send {
    /// Number of lines. Never zero: an empty document has one empty line.
    fn line_count(&self) -> usize;

    fn line(&self, index: usize) -> Option<&str>;

    /// Insert `text` before `pos`.
    fn insert_at(&mut self, pos: Position, text: &str);

    /// Remove the text in `range` and return it.
    fn delete_range(&mut self, range: TextRange) -> String;

    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, pos: Position);

    /// Location of the document on disk, if it has one.
    fn path(&self) -> Option<&Path> {
        None
    }

    fn line_len(&self, index: usize) -> usize {
        self.line(index).map_or(0, |l| l.chars().count())
    }

    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    fn end_position(&self) -> Position {
        let last = self.last_line();
        Position::new(last, self.line_len(last))
    }

    /// Clamp `pos` into the buffer. Columns may sit one past the last char.
    fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        Position::new(line, pos.column.min(self.line_len(line)))
    }

    fn read_range(&self, range: TextRange) -> String {
        let start = self.clamp_position(range.start);
        let end = self.clamp_position(range.end);
        let mut out = String::new();
        for index in start.line..=end.line {
            let Some(line) = self.line(index) else { break };
            let from = if index == start.line {
                byte_offset(line, start.column)
            } else {
                0
            };
            let to = if index == end.line {
                byte_offset(line, end.column)
            } else {
                line.len()
            };
            out.push_str(&line[from..to.max(from)]);
            if index != end.line {
                out.push('\n');
            }
        }
        out
    }

    fn text(&self) -> String {
        self.read_range(TextRange::new(Position::default(), self.end_position()))
    }

    fn replace_range(&mut self, range: TextRange, text: &str) -> String {
        let removed = self.delete_range(range);
        self.insert_at(range.start, text);
        removed
    }

    /// Remove whole lines `first..=last` and return them, each newline-terminated.
    fn delete_lines(&mut self, first: usize, last: usize) -> String {
        let last = last.min(self.last_line());
        let first = first.min(last);
        // Removing the tail of the buffer eats the newline before `first`.
        let eats_previous_newline = last == self.last_line() && first > 0;
        let range = if last < self.last_line() {
            TextRange::new(Position::new(first, 0), Position::new(last + 1, 0))
        } else if eats_previous_newline {
            TextRange::new(
                Position::new(first - 1, self.line_len(first - 1)),
                Position::new(last, self.line_len(last)),
            )
        } else {
            TextRange::new(Position::default(), self.end_position())
        };
        let mut removed = self.delete_range(range);
        if eats_previous_newline && removed.starts_with('\n') {
            removed.remove(0);
        }
        if !removed.ends_with('\n') {
            removed.push('\n');
        }
        removed
    }

    fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            text: self.text(),
            cursor: self.cursor(),
        }
    }

    fn restore(&mut self, snapshot: &BufferSnapshot) {
        let all = TextRange::new(Position::default(), self.end_position());
        self.delete_range(all);
        self.insert_at(Position::default(), &snapshot.text);
        let cursor = self.clamp_position(snapshot.cursor);
        self.set_cursor(cursor);
    }
}

/// A plain in-memory buffer: one `String` per line, no trailing newlines.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    lines: Vec<String>,
    cursor: Position,
    path: Option<PathBuf>,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Position::default(),
            path: None,
        }
    }

    /// Create a buffer from file contents. One trailing newline is the line
    /// terminator of the last line, not an extra empty line.
    pub fn from_text(text: &str) -> Self {
        let body = text.strip_suffix('\n').unwrap_or(text);
        Self {
            lines: body.split('\n').map(String::from).collect(),
            cursor: Position::default(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TextBuffer for MemoryBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn insert_at(&mut self, pos: Position, text: &str) {
        if text.is_empty() {
            return;
        }
        let pos = self.clamp_position(pos);
        let current = &self.lines[pos.line];
        let at = byte_offset(current, pos.column);
        let tail = current[at..].to_string();
        let mut head = current[..at].to_string();

        let mut pieces = text.split('\n');
        head.push_str(pieces.next().unwrap_or_default());
        let mut replacement = vec![head];
        replacement.extend(pieces.map(String::from));
        if let Some(last) = replacement.last_mut() {
            last.push_str(&tail);
        }
        self.lines.splice(pos.line..=pos.line, replacement);
    }

    fn delete_range(&mut self, range: TextRange) -> String {
        let start = self.clamp_position(range.start);
        let end = self.clamp_position(range.end);
        if start >= end {
            return String::new();
        }
        let removed = self.read_range(TextRange { start, end });

        let head_line = &self.lines[start.line];
        let head = head_line[..byte_offset(head_line, start.column)].to_string();
        let tail_line = &self.lines[end.line];
        let tail = &tail_line[byte_offset(tail_line, end.column)..];
        let joined = format!("{head}{tail}");
        self.lines.splice(start.line..=end.line, [joined]);

        let cursor = self.clamp_position(self.cursor);
        self.cursor = cursor;
        removed
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp_position(pos);
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
