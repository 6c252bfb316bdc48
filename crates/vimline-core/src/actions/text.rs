//! Text scanning helpers shared by motions and text objects.
//!
//! Everything works on character columns. Positions one past the end of a
//! line are accepted as input wherever a cursor can sit there.

use crate::buffer::{Position, TextBuffer};

use super::motion::FindKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punctuation,
}

/// Classify a character. With `big` set (WORD motions) everything that is
/// not blank is a word character.
pub fn char_class(c: char, big: bool) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if big || c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

pub fn line_chars(buf: &dyn TextBuffer, line: usize) -> Vec<char> {
    buf.line(line).map(|l| l.chars().collect()).unwrap_or_default()
}

pub fn char_at(buf: &dyn TextBuffer, pos: Position) -> Option<char> {
    buf.line(pos.line)?.chars().nth(pos.column)
}

pub fn is_empty_line(buf: &dyn TextBuffer, line: usize) -> bool {
    buf.line_len(line) == 0
}

/// Next character position, crossing into the following line.
/// Empty lines are visited at column 0.
pub fn next_char(buf: &dyn TextBuffer, pos: Position) -> Option<Position> {
    if pos.column + 1 < buf.line_len(pos.line) {
        Some(Position::new(pos.line, pos.column + 1))
    } else if pos.line < buf.last_line() {
        Some(Position::new(pos.line + 1, 0))
    } else {
        None
    }
}

/// Previous character position, crossing into the line above.
pub fn prev_char(buf: &dyn TextBuffer, pos: Position) -> Option<Position> {
    let len = buf.line_len(pos.line);
    if pos.column > 0 && len > 0 {
        Some(Position::new(pos.line, pos.column.min(len) - 1))
    } else if pos.line > 0 {
        let above = pos.line - 1;
        Some(Position::new(above, buf.line_len(above).saturating_sub(1)))
    } else {
        None
    }
}

/// Column of the first non-blank character (the last one on a blank line).
pub fn first_non_blank(buf: &dyn TextBuffer, line: usize) -> usize {
    let chars = line_chars(buf, line);
    chars
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(chars.len().saturating_sub(1))
}

/// Start of the next word (`w`). Stops at empty lines; at the end of the
/// buffer returns the position just past the last character.
pub fn word_forward(buf: &dyn TextBuffer, pos: Position, big: bool) -> Position {
    let mut line = pos.line;
    let mut chars = line_chars(buf, line);
    let mut col = pos.column;

    if col < chars.len() {
        let class = char_class(chars[col], big);
        if class != CharClass::Blank {
            while col < chars.len() && char_class(chars[col], big) == class {
                col += 1;
            }
        }
    }

    loop {
        if col >= chars.len() {
            if line >= buf.last_line() {
                return Position::new(line, chars.len());
            }
            line += 1;
            col = 0;
            chars = line_chars(buf, line);
            if chars.is_empty() {
                return Position::new(line, 0);
            }
            continue;
        }
        if char_class(chars[col], big) == CharClass::Blank {
            col += 1;
            continue;
        }
        return Position::new(line, col);
    }
}

/// End of the current or next word (`e`).
pub fn word_end(buf: &dyn TextBuffer, pos: Position, big: bool) -> Position {
    let Some(mut p) = next_char(buf, pos) else {
        return pos;
    };
    loop {
        match char_at(buf, p) {
            Some(c) if char_class(c, big) != CharClass::Blank => break,
            _ => match next_char(buf, p) {
                Some(next) => p = next,
                None => return p,
            },
        }
    }
    let chars = line_chars(buf, p.line);
    let class = char_class(chars[p.column], big);
    while p.column + 1 < chars.len() && char_class(chars[p.column + 1], big) == class {
        p.column += 1;
    }
    p
}

/// Start of the current or previous word (`b`). Empty lines count as words.
pub fn word_backward(buf: &dyn TextBuffer, pos: Position, big: bool) -> Position {
    let Some(mut p) = prev_char(buf, pos) else {
        return pos;
    };
    loop {
        if is_empty_line(buf, p.line) {
            return p;
        }
        match char_at(buf, p) {
            Some(c) if char_class(c, big) != CharClass::Blank => break,
            _ => match prev_char(buf, p) {
                Some(prev) => p = prev,
                None => return p,
            },
        }
    }
    let chars = line_chars(buf, p.line);
    let class = char_class(chars[p.column], big);
    while p.column > 0 && char_class(chars[p.column - 1], big) == class {
        p.column -= 1;
    }
    p
}

/// Whether `pos` sits on the last character of a word.
pub fn is_word_end(buf: &dyn TextBuffer, pos: Position, big: bool) -> bool {
    let chars = line_chars(buf, pos.line);
    let Some(&c) = chars.get(pos.column) else {
        return false;
    };
    let class = char_class(c, big);
    class != CharClass::Blank
        && chars
            .get(pos.column + 1)
            .is_none_or(|&next| char_class(next, big) != class)
}

/// Column reached by `f`/`F`/`t`/`T` on one line. `repeat` is set for `;`
/// and `,`, where a till search must not stop right next to the cursor.
pub fn find_in_line(
    chars: &[char],
    column: usize,
    kind: FindKind,
    target: char,
    count: usize,
    repeat: bool,
) -> Option<usize> {
    let skip = usize::from(repeat && kind.is_till());
    let count = count.max(1);
    match kind {
        FindKind::Forward | FindKind::TillForward => {
            let found = chars
                .iter()
                .enumerate()
                .skip(column + 1 + skip)
                .filter(|(_, c)| **c == target)
                .nth(count - 1)
                .map(|(i, _)| i)?;
            Some(if kind.is_till() { found - 1 } else { found })
        }
        FindKind::Backward | FindKind::TillBackward => {
            let end = column.saturating_sub(skip).min(chars.len());
            let found = chars[..end]
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, c)| **c == target)
                .nth(count - 1)
                .map(|(i, _)| i)?;
            Some(if kind.is_till() { found + 1 } else { found })
        }
    }
}

/// `}`: the next empty line after a paragraph, or the end of the buffer.
pub fn paragraph_forward(buf: &dyn TextBuffer, line: usize, count: usize) -> Position {
    let last = buf.last_line();
    let mut l = line;
    for _ in 0..count.max(1) {
        while l < last && is_empty_line(buf, l) {
            l += 1;
        }
        while l < last && !is_empty_line(buf, l) {
            l += 1;
        }
    }
    if is_empty_line(buf, l) {
        Position::new(l, 0)
    } else {
        Position::new(l, buf.line_len(l))
    }
}

/// `{`: the previous empty line before a paragraph, or the top.
pub fn paragraph_backward(buf: &dyn TextBuffer, line: usize, count: usize) -> Position {
    let mut l = line;
    for _ in 0..count.max(1) {
        while l > 0 && is_empty_line(buf, l) {
            l -= 1;
        }
        while l > 0 && !is_empty_line(buf, l) {
            l -= 1;
        }
    }
    Position::new(l, 0)
}

/// `iw`/`aw` (and the WORD forms): inclusive column span on the cursor line.
pub fn word_object(
    buf: &dyn TextBuffer,
    pos: Position,
    big: bool,
    around: bool,
) -> Option<(Position, Position)> {
    let chars = line_chars(buf, pos.line);
    if chars.is_empty() {
        return None;
    }
    let len = chars.len();
    let col = pos.column.min(len - 1);
    let class_at = |i: usize| char_class(chars[i], big);
    let class = class_at(col);

    let mut start = col;
    while start > 0 && class_at(start - 1) == class {
        start -= 1;
    }
    let mut end = col;
    while end + 1 < len && class_at(end + 1) == class {
        end += 1;
    }

    if around {
        if class == CharClass::Blank {
            if end + 1 < len {
                let next = class_at(end + 1);
                end += 1;
                while end + 1 < len && class_at(end + 1) == next {
                    end += 1;
                }
            }
        } else if end + 1 < len && class_at(end + 1) == CharClass::Blank {
            while end + 1 < len && class_at(end + 1) == CharClass::Blank {
                end += 1;
            }
        } else {
            while start > 0 && class_at(start - 1) == CharClass::Blank {
                start -= 1;
            }
        }
    }
    Some((Position::new(pos.line, start), Position::new(pos.line, end)))
}

/// `i"`/`a"` and friends. Looks for the quoted string around the cursor, or
/// the first one after it on the same line.
pub fn quote_object(
    buf: &dyn TextBuffer,
    pos: Position,
    quote: char,
    around: bool,
) -> Option<(Position, Position)> {
    let chars = line_chars(buf, pos.line);
    let quotes: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(i, c)| **c == quote && (*i == 0 || chars[i - 1] != '\\'))
        .map(|(i, _)| i)
        .collect();
    let col = pos.column;
    let (open, close) = quotes
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|&(open, close)| (open <= col && col <= close) || open > col)?;

    let at = |c: usize| Position::new(pos.line, c);
    if around {
        let (mut start, mut end) = (open, close);
        if end + 1 < chars.len() && chars[end + 1].is_whitespace() {
            while end + 1 < chars.len() && chars[end + 1].is_whitespace() {
                end += 1;
            }
        } else {
            while start > 0 && chars[start - 1].is_whitespace() {
                start -= 1;
            }
        }
        Some((at(start), at(end)))
    } else if close == open + 1 {
        None
    } else {
        Some((at(open + 1), at(close - 1)))
    }
}

/// `i(`/`a(` and friends. Brackets may span lines and nest.
pub fn bracket_object(
    buf: &dyn TextBuffer,
    pos: Position,
    open: char,
    close: char,
    around: bool,
) -> Option<(Position, Position)> {
    let pos = buf.clamp_position(pos);
    let mut depth = 0usize;
    let mut p = pos;
    if char_at(buf, p) == Some(close) {
        p = prev_char(buf, p)?;
    }
    let open_at = loop {
        match char_at(buf, p) {
            Some(c) if c == open => {
                if depth == 0 {
                    break p;
                }
                depth -= 1;
            }
            Some(c) if c == close => depth += 1,
            _ => {}
        }
        p = prev_char(buf, p)?;
    };

    let mut depth = 0usize;
    let mut p = next_char(buf, open_at)?;
    let close_at = loop {
        match char_at(buf, p) {
            Some(c) if c == close => {
                if depth == 0 {
                    break p;
                }
                depth -= 1;
            }
            Some(c) if c == open => depth += 1,
            _ => {}
        }
        p = next_char(buf, p)?;
    };

    if around {
        return Some((open_at, close_at));
    }
    let inner_start = next_char(buf, open_at)?;
    if inner_start == close_at {
        return None;
    }
    let inner_end = prev_char(buf, close_at)?;
    Some((inner_start, inner_end))
}

/// `ip`/`ap`: the inclusive line span of the paragraph (or run of empty
/// lines) under the cursor. `ap` adds the run that follows, or the one
/// before when there is nothing after.
pub fn paragraph_object(buf: &dyn TextBuffer, line: usize, around: bool) -> (usize, usize) {
    let last = buf.last_line();
    let empty = is_empty_line(buf, line);
    let mut start = line;
    while start > 0 && is_empty_line(buf, start - 1) == empty {
        start -= 1;
    }
    let mut end = line;
    while end < last && is_empty_line(buf, end + 1) == empty {
        end += 1;
    }
    if around {
        if end < last {
            let next = is_empty_line(buf, end + 1);
            end += 1;
            while end < last && is_empty_line(buf, end + 1) == next {
                end += 1;
            }
        } else if start > 0 {
            let prev = is_empty_line(buf, start - 1);
            start -= 1;
            while start > 0 && is_empty_line(buf, start - 1) == prev {
                start -= 1;
            }
        }
    }
    (start, end)
}
