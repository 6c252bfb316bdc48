//! Operators and the ranges they act on.

use crate::buffer::{advance, Position, TextBuffer, TextRange};
use crate::error::ActionError;
use crate::mode::Mode;
use crate::registers::{Register, RegisterKind};
use crate::session::SessionState;

use super::motion::{MotionType, Span};
use super::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    ShiftRight,
    ShiftLeft,
    Lowercase,
    Uppercase,
    ToggleCase,
}

/// Text an operator runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRange {
    Chars(TextRange),
    Lines { first: usize, last: usize },
    /// Rectangle with inclusive corners, from a visual block.
    Block {
        top: usize,
        bottom: usize,
        left: usize,
        right: usize,
    },
}

impl OperatorRange {
    /// The range covered by moving from `from` to `to`.
    pub fn from_motion(
        buf: &dyn TextBuffer,
        from: Position,
        to: Position,
        kind: MotionType,
    ) -> Self {
        let (start, end) = if from <= to { (from, to) } else { (to, from) };
        match kind {
            MotionType::Linewise => Self::Lines {
                first: start.line,
                last: end.line,
            },
            MotionType::Inclusive => Self::Chars(TextRange::new(
                start,
                buf.clamp_position(Position::new(end.line, end.column + 1)),
            )),
            MotionType::Exclusive => {
                // An exclusive end in column 0 stops at the end of the line above;
                // if the start is at or before the indent too, whole lines are used.
                if end.line > start.line && end.column == 0 {
                    let above = end.line - 1;
                    if start.column <= text::first_non_blank(buf, start.line) {
                        return Self::Lines {
                            first: start.line,
                            last: above,
                        };
                    }
                    return Self::Chars(TextRange::new(
                        start,
                        Position::new(above, buf.line_len(above)),
                    ));
                }
                Self::Chars(TextRange::new(start, end))
            }
        }
    }

    /// The range selected by a text object.
    pub fn from_span(buf: &dyn TextBuffer, span: Span) -> Self {
        Self::from_motion(buf, span.start, span.end, span.kind)
    }

    fn lines(&self) -> (usize, usize) {
        match *self {
            Self::Chars(r) => (r.start.line, r.end.line),
            Self::Lines { first, last } => (first, last),
            Self::Block { top, bottom, .. } => (top, bottom),
        }
    }
}

impl Operator {
    pub fn modifies(self) -> bool {
        self != Self::Yank
    }

    /// Run the operator. Returns the mode to continue in.
    pub fn apply(
        self,
        session: &mut SessionState,
        range: OperatorRange,
        register: Option<char>,
    ) -> Result<Mode, ActionError> {
        match self {
            Self::Delete => {
                delete(session, range, register);
                Ok(Mode::Normal)
            }
            Self::Change => {
                change(session, range, register);
                Ok(Mode::Insert)
            }
            Self::Yank => {
                yank(session, range, register);
                Ok(Mode::Normal)
            }
            Self::ShiftRight | Self::ShiftLeft => {
                let (first, last) = range.lines();
                shift_lines(session, first, last, self == Self::ShiftRight);
                Ok(Mode::Normal)
            }
            Self::Lowercase | Self::Uppercase | Self::ToggleCase => {
                map_case(session, range, self);
                Ok(Mode::Normal)
            }
        }
    }
}

fn delete(session: &mut SessionState, range: OperatorRange, register: Option<char>) {
    let buf = session.buffer.as_mut();
    match range {
        OperatorRange::Chars(r) => {
            let removed = buf.delete_range(r);
            buf.set_cursor(r.start);
            session.registers.store_delete(register, Register::charwise(removed));
        }
        OperatorRange::Lines { first, last } => {
            let removed = buf.delete_lines(first, last);
            let line = first.min(buf.last_line());
            buf.set_cursor(Position::new(line, text::first_non_blank(buf, line)));
            session.registers.store_delete(register, Register::linewise(removed));
        }
        OperatorRange::Block { .. } => {
            let removed = remove_block(buf, range);
            session.registers.store_delete(register, Register::blockwise(removed));
        }
    }
}

fn change(session: &mut SessionState, range: OperatorRange, register: Option<char>) {
    match range {
        OperatorRange::Lines { first, last } => {
            let buf = session.buffer.as_mut();
            let last = last.min(buf.last_line());
            let removed = buf.read_range(TextRange::new(
                Position::new(first, 0),
                Position::new(last, buf.line_len(last)),
            ));
            buf.delete_range(TextRange::new(
                Position::new(first, 0),
                Position::new(last, buf.line_len(last)),
            ));
            buf.set_cursor(Position::new(first, 0));
            session.registers.store_delete(register, Register::linewise(removed));
        }
        _ => delete(session, range, register),
    }
}

fn yank(session: &mut SessionState, range: OperatorRange, register: Option<char>) {
    let buf = session.buffer.as_mut();
    let cursor = buf.cursor();
    let yanked = match range {
        OperatorRange::Chars(r) => {
            buf.set_cursor(r.start);
            Register::charwise(buf.read_range(r))
        }
        OperatorRange::Lines { first, last } => {
            let last = last.min(buf.last_line());
            if first < cursor.line {
                buf.set_cursor(Position::new(first, cursor.column));
            }
            Register::linewise(buf.read_range(TextRange::new(
                Position::new(first, 0),
                Position::new(last, buf.line_len(last)),
            )))
        }
        OperatorRange::Block {
            top,
            bottom,
            left,
            right,
        } => {
            buf.set_cursor(Position::new(top, left));
            let pieces: Vec<String> = (top..=bottom.min(buf.last_line()))
                .map(|line| {
                    buf.read_range(TextRange::new(
                        Position::new(line, left),
                        Position::new(line, right + 1),
                    ))
                })
                .collect();
            Register::blockwise(pieces.join("\n"))
        }
    };
    session.registers.store_yank(register, yanked);
}

fn remove_block(buf: &mut dyn TextBuffer, range: OperatorRange) -> String {
    let OperatorRange::Block {
        top,
        bottom,
        left,
        right,
    } = range
    else {
        return String::new();
    };
    let pieces: Vec<String> = (top..=bottom.min(buf.last_line()))
        .map(|line| {
            buf.delete_range(TextRange::new(
                Position::new(line, left),
                Position::new(line, right + 1),
            ))
        })
        .collect();
    buf.set_cursor(Position::new(top, left));
    pieces.join("\n")
}

fn shift_lines(session: &mut SessionState, first: usize, last: usize, right: bool) {
    let width = session.options.shiftwidth;
    let buf = session.buffer.as_mut();
    for line in first..=last.min(buf.last_line()) {
        let chars = text::line_chars(buf, line);
        if chars.is_empty() {
            continue;
        }
        if right {
            buf.insert_at(Position::new(line, 0), &" ".repeat(width));
        } else {
            let mut removed_width = 0;
            let mut columns = 0;
            for c in &chars {
                match c {
                    ' ' if removed_width < width => removed_width += 1,
                    '\t' if removed_width < width => removed_width = width,
                    _ => break,
                }
                columns += 1;
            }
            buf.delete_range(TextRange::new(
                Position::new(line, 0),
                Position::new(line, columns),
            ));
        }
    }
    buf.set_cursor(Position::new(first, text::first_non_blank(buf, first)));
}

fn convert(s: &str, op: Operator) -> String {
    match op {
        Operator::Lowercase => s.to_lowercase(),
        Operator::Uppercase => s.to_uppercase(),
        _ => s
            .chars()
            .flat_map(|c| {
                let flipped: Vec<char> = if c.is_uppercase() {
                    c.to_lowercase().collect()
                } else {
                    c.to_uppercase().collect()
                };
                flipped
            })
            .collect(),
    }
}

fn map_case(session: &mut SessionState, range: OperatorRange, op: Operator) {
    let buf = session.buffer.as_mut();
    let spans: Vec<TextRange> = match range {
        OperatorRange::Chars(r) => vec![r],
        OperatorRange::Lines { first, last } => (first..=last.min(buf.last_line()))
            .map(|l| TextRange::new(Position::new(l, 0), Position::new(l, buf.line_len(l))))
            .collect(),
        OperatorRange::Block {
            top,
            bottom,
            left,
            right,
        } => (top..=bottom.min(buf.last_line()))
            .map(|l| TextRange::new(Position::new(l, left), Position::new(l, right + 1)))
            .collect(),
    };
    for span in &spans {
        let original = buf.read_range(*span);
        let converted = convert(&original, op);
        if converted != original {
            buf.replace_range(*span, &converted);
        }
    }
    if let Some(first) = spans.first() {
        buf.set_cursor(first.start);
    }
}

/// `~` in Normal mode: flip `count` characters and step past them.
pub fn toggle_case_chars(session: &mut SessionState, count: usize) {
    let buf = session.buffer.as_mut();
    let cursor = buf.cursor();
    let len = buf.line_len(cursor.line);
    if len == 0 {
        return;
    }
    let end = (cursor.column + count.max(1)).min(len);
    let range = TextRange::new(cursor, Position::new(cursor.line, end));
    let converted = convert(&buf.read_range(range), Operator::ToggleCase);
    buf.replace_range(range, &converted);
    buf.set_cursor(Position::new(cursor.line, end.min(len - 1)));
}

/// Insert the contents of a register after (or before) the cursor,
/// `count` times. Used by `p`, `P` and `:put`.
pub fn put(
    session: &mut SessionState,
    register: Option<char>,
    count: usize,
    before: bool,
) -> Result<(), ActionError> {
    let reg = session
        .registers
        .get(register)
        .filter(|r| !r.content.is_empty())
        .cloned()
        .ok_or(ActionError::EmptyRegister(register.unwrap_or('"')))?;
    let buf = session.buffer.as_mut();
    let cursor = buf.cursor();
    let count = count.max(1);

    match reg.kind {
        RegisterKind::Charwise => {
            let content = reg.content.repeat(count);
            let column = if before || buf.line_len(cursor.line) == 0 {
                cursor.column
            } else {
                cursor.column + 1
            };
            let at = buf.clamp_position(Position::new(cursor.line, column));
            buf.insert_at(at, &content);
            let end = advance(at, &content);
            let landing = if content.contains('\n') {
                at
            } else {
                Position::new(end.line, end.column.saturating_sub(1))
            };
            buf.set_cursor(landing);
        }
        RegisterKind::Linewise => {
            put_lines(buf, cursor.line, &reg.content.repeat(count), before);
        }
        RegisterKind::Blockwise => {
            let column = if before || buf.line_len(cursor.line) == 0 {
                cursor.column
            } else {
                cursor.column + 1
            };
            for (i, piece) in reg.content.split('\n').enumerate() {
                let line = cursor.line + i;
                if line > buf.last_line() {
                    let end = buf.end_position();
                    buf.insert_at(end, "\n");
                }
                let len = buf.line_len(line);
                if len < column {
                    buf.insert_at(Position::new(line, len), &" ".repeat(column - len));
                }
                buf.insert_at(Position::new(line, column), &piece.repeat(count));
            }
            buf.set_cursor(Position::new(cursor.line, column));
        }
    }
    Ok(())
}

/// Insert newline-terminated `lines` below (or above) `line` and move to the
/// first non-blank of the first inserted line.
pub fn put_lines(buf: &mut dyn TextBuffer, line: usize, lines: &str, above: bool) {
    let line = line.min(buf.last_line());
    let first = if above {
        buf.insert_at(Position::new(line, 0), lines);
        line
    } else if line < buf.last_line() {
        buf.insert_at(Position::new(line + 1, 0), lines);
        line + 1
    } else {
        let body = lines.strip_suffix('\n').unwrap_or(lines);
        let end = Position::new(line, buf.line_len(line));
        buf.insert_at(end, &format!("\n{body}"));
        line + 1
    };
    buf.set_cursor(Position::new(first, text::first_non_blank(buf, first)));
}

/// `J`: join `count` lines (at least two) with single spaces.
pub fn join_lines(buf: &mut dyn TextBuffer, first: usize, count: usize) -> bool {
    let last = (first + count.max(2) - 1).min(buf.last_line());
    if last <= first {
        return false;
    }
    let mut join_column = 0;
    for _ in first..last {
        let current_len = buf.line_len(first);
        let next = text::line_chars(buf, first + 1);
        let indent = next.iter().take_while(|c| c.is_whitespace()).count();
        let current = text::line_chars(buf, first);
        let separator = if indent == next.len()
            || current.last().is_some_and(|c| c.is_whitespace())
            || current.is_empty()
            || next.get(indent) == Some(&')')
        {
            ""
        } else {
            " "
        };
        buf.replace_range(
            TextRange::new(
                Position::new(first, current_len),
                Position::new(first + 1, indent),
            ),
            separator,
        );
        join_column = current_len;
    }
    buf.set_cursor(Position::new(first, join_column));
    true
}

/// `r{char}`: replace `count` characters under and after the cursor.
pub fn replace_chars(buf: &mut dyn TextBuffer, ch: char, count: usize) -> Result<(), ActionError> {
    let cursor = buf.cursor();
    let count = count.max(1);
    if cursor.column + count > buf.line_len(cursor.line) {
        return Err(ActionError::MotionFailed);
    }
    let range = TextRange::new(cursor, Position::new(cursor.line, cursor.column + count));
    buf.replace_range(range, &ch.to_string().repeat(count));
    buf.set_cursor(Position::new(cursor.line, cursor.column + count - 1));
    Ok(())
}
