//! Motions and text objects.

use crate::buffer::{Position, TextBuffer};
use crate::session::SessionState;

use super::text;

/// How an operator treats the span covered by a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    /// The target character is not included.
    Exclusive,
    /// The target character is included.
    Inclusive,
    /// Whole lines, whatever the columns.
    Linewise,
}

/// The four in-line character searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindKind {
    /// `f`
    Forward,
    /// `F`
    Backward,
    /// `t`
    TillForward,
    /// `T`
    TillBackward,
}

impl FindKind {
    pub fn is_till(self) -> bool {
        matches!(self, Self::TillForward | Self::TillBackward)
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::TillForward => Self::TillBackward,
            Self::TillBackward => Self::TillForward,
        }
    }

    fn motion_type(self) -> MotionType {
        match self {
            Self::Forward | Self::TillForward => MotionType::Inclusive,
            Self::Backward | Self::TillBackward => MotionType::Exclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// `<Space>`: right, continuing on the next line.
    SpaceRight,
    WordForward { big: bool },
    WordBackward { big: bool },
    WordEnd { big: bool },
    /// `0`
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`
    LineEnd,
    /// Insert-mode `<End>`: one past the last character.
    InsertLineEnd,
    /// `gg`: first line, or line `count`.
    FirstLine,
    /// `G`: last line, or line `count`.
    LastLine,
    /// `f`, `F`, `t`, `T` followed by the character.
    Find(FindKind),
    /// `;`
    RepeatFind,
    /// `,`
    RepeatFindReverse,
    /// `}`
    ParagraphForward,
    /// `{`
    ParagraphBackward,
    /// `'x`: first non-blank of the mark's line.
    MarkLine,
    /// `` `x ``: the mark's exact position.
    MarkExact,
    /// `<C-d>`
    HalfPageDown,
    /// `<C-u>`
    HalfPageUp,
}

/// Where a motion lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub position: Position,
    pub kind: MotionType,
}

impl Target {
    fn new(position: Position, kind: MotionType) -> Self {
        Self { position, kind }
    }
}

impl Motion {
    /// Up and down keep the remembered column.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Jumps remember where they came from in the `'` mark.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Self::FirstLine
                | Self::LastLine
                | Self::ParagraphForward
                | Self::ParagraphBackward
                | Self::MarkLine
                | Self::MarkExact
        )
    }

    /// Compute the target from the cursor. `None` when the motion cannot
    /// move (start of line for `h`, character not found for `f`, ...).
    pub fn evaluate(
        self,
        session: &SessionState,
        count: Option<usize>,
        ch: Option<char>,
    ) -> Option<Target> {
        let buf = session.buffer.as_ref();
        let cursor = buf.cursor();
        let n = count.unwrap_or(1).max(1);
        let line_len = buf.line_len(cursor.line);

        match self {
            Self::Left => {
                if cursor.column == 0 {
                    return None;
                }
                let column = cursor.column.min(line_len).saturating_sub(n);
                Some(Target::new(
                    Position::new(cursor.line, column),
                    MotionType::Exclusive,
                ))
            }
            Self::Right => {
                let column = (cursor.column + n).min(line_len);
                (column > cursor.column).then(|| {
                    Target::new(Position::new(cursor.line, column), MotionType::Exclusive)
                })
            }
            Self::Up | Self::Down => {
                let line = if self == Self::Up {
                    cursor.line.checked_sub(n.min(cursor.line).max(1))?
                } else {
                    let line = (cursor.line + n).min(buf.last_line());
                    if line == cursor.line {
                        return None;
                    }
                    line
                };
                let want = session.desired_column.unwrap_or(cursor.column);
                Some(Target::new(
                    Position::new(line, want.min(buf.line_len(line))),
                    MotionType::Linewise,
                ))
            }
            Self::SpaceRight => {
                let mut p = cursor;
                for _ in 0..n {
                    p = text::next_char(buf, p)?;
                }
                Some(Target::new(p, MotionType::Exclusive))
            }
            Self::WordForward { big } => {
                let mut p = cursor;
                for _ in 0..n {
                    p = text::word_forward(buf, p, big);
                }
                (p != cursor).then(|| Target::new(p, MotionType::Exclusive))
            }
            Self::WordBackward { big } => {
                let mut p = cursor;
                for _ in 0..n {
                    p = text::word_backward(buf, p, big);
                }
                (p != cursor).then(|| Target::new(p, MotionType::Exclusive))
            }
            Self::WordEnd { big } => {
                let mut p = cursor;
                for _ in 0..n {
                    p = text::word_end(buf, p, big);
                }
                (p != cursor).then(|| Target::new(p, MotionType::Inclusive))
            }
            Self::LineStart => Some(Target::new(
                Position::new(cursor.line, 0),
                MotionType::Exclusive,
            )),
            Self::FirstNonBlank => Some(Target::new(
                Position::new(cursor.line, text::first_non_blank(buf, cursor.line)),
                MotionType::Exclusive,
            )),
            Self::LineEnd => {
                let line = (cursor.line + n - 1).min(buf.last_line());
                Some(Target::new(
                    Position::new(line, buf.line_len(line).saturating_sub(1)),
                    MotionType::Inclusive,
                ))
            }
            Self::InsertLineEnd => Some(Target::new(
                Position::new(cursor.line, line_len),
                MotionType::Exclusive,
            )),
            Self::FirstLine | Self::LastLine => {
                let default = if self == Self::FirstLine {
                    0
                } else {
                    buf.last_line()
                };
                let line = count
                    .map_or(default, |c| c.saturating_sub(1))
                    .min(buf.last_line());
                Some(Target::new(
                    Position::new(line, text::first_non_blank(buf, line)),
                    MotionType::Linewise,
                ))
            }
            Self::Find(kind) => find(buf, cursor, kind, ch?, n, false),
            Self::RepeatFind => {
                let (kind, ch) = session.last_find?;
                find(buf, cursor, kind, ch, n, true)
            }
            Self::RepeatFindReverse => {
                let (kind, ch) = session.last_find?;
                find(buf, cursor, kind.reversed(), ch, n, true)
            }
            Self::ParagraphForward => Some(Target::new(
                text::paragraph_forward(buf, cursor.line, n),
                MotionType::Exclusive,
            )),
            Self::ParagraphBackward => Some(Target::new(
                text::paragraph_backward(buf, cursor.line, n),
                MotionType::Exclusive,
            )),
            Self::MarkLine => {
                let mark = buf.clamp_position(session.marks.get(ch?)?);
                Some(Target::new(
                    Position::new(mark.line, text::first_non_blank(buf, mark.line)),
                    MotionType::Linewise,
                ))
            }
            Self::MarkExact => Some(Target::new(
                buf.clamp_position(session.marks.get(ch?)?),
                MotionType::Exclusive,
            )),
            Self::HalfPageDown | Self::HalfPageUp => {
                let amount = count.unwrap_or(session.options.scroll).max(1);
                let line = if self == Self::HalfPageDown {
                    (cursor.line + amount).min(buf.last_line())
                } else {
                    cursor.line.saturating_sub(amount)
                };
                (line != cursor.line).then(|| {
                    Target::new(
                        Position::new(line, text::first_non_blank(buf, line)),
                        MotionType::Linewise,
                    )
                })
            }
        }
    }
}

fn find(
    buf: &dyn TextBuffer,
    cursor: Position,
    kind: FindKind,
    ch: char,
    count: usize,
    repeat: bool,
) -> Option<Target> {
    let chars = text::line_chars(buf, cursor.line);
    let column = text::find_in_line(&chars, cursor.column, kind, ch, count, repeat)?;
    Some(Target::new(
        Position::new(cursor.line, column),
        kind.motion_type(),
    ))
}

/// `cw` changes to the end of the word, like `ce`, except that on the last
/// character of a word it changes only that character.
pub fn change_word_target(
    buf: &dyn TextBuffer,
    cursor: Position,
    big: bool,
    count: usize,
) -> Target {
    let mut p = cursor;
    for i in 0..count.max(1) {
        if i == 0 && text::is_word_end(buf, p, big) {
            continue;
        }
        p = text::word_end(buf, p, big);
    }
    Target::new(p, MotionType::Inclusive)
}

/// An inclusive span selected by a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub kind: MotionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObject {
    Word { big: bool, around: bool },
    Quote { quote: char, around: bool },
    Bracket { open: char, close: char, around: bool },
    Paragraph { around: bool },
}

impl TextObject {
    pub fn select(self, buf: &dyn TextBuffer, cursor: Position) -> Option<Span> {
        let chars = |(start, end): (Position, Position)| Span {
            start,
            end,
            kind: MotionType::Inclusive,
        };
        match self {
            Self::Word { big, around } => text::word_object(buf, cursor, big, around).map(chars),
            Self::Quote { quote, around } => {
                text::quote_object(buf, cursor, quote, around).map(chars)
            }
            Self::Bracket {
                open,
                close,
                around,
            } => text::bracket_object(buf, cursor, open, close, around).map(chars),
            Self::Paragraph { around } => {
                let (first, last) = text::paragraph_object(buf, cursor.line, around);
                Some(Span {
                    start: Position::new(first, 0),
                    end: Position::new(last, buf.line_len(last).saturating_sub(1)),
                    kind: MotionType::Linewise,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    fn session(text: &str, cursor: Position) -> SessionState {
        let mut buf = MemoryBuffer::from_text(text);
        buf.set_cursor(cursor);
        SessionState::new(Box::new(buf))
    }

    fn target(motion: Motion, s: &SessionState, count: Option<usize>) -> Option<Position> {
        motion.evaluate(s, count, None).map(|t| t.position)
    }

    #[test]
    fn test_left_right() {
        let s = session("abcdef", Position::new(0, 2));
        assert_eq!(target(Motion::Left, &s, Some(5)), Some(Position::new(0, 0)));
        assert_eq!(target(Motion::Right, &s, Some(2)), Some(Position::new(0, 4)));
        assert_eq!(target(Motion::Right, &s, Some(99)), Some(Position::new(0, 6)));

        let s = session("abc", Position::new(0, 0));
        assert_eq!(target(Motion::Left, &s, None), None);
    }

    #[test]
    fn test_vertical_motions_use_desired_column() {
        let mut s = session("long line\nab\nanother long", Position::new(0, 7));
        assert_eq!(target(Motion::Down, &s, None), Some(Position::new(1, 2)));
        s.desired_column = Some(7);
        assert_eq!(target(Motion::Down, &s, Some(2)), Some(Position::new(2, 7)));
        assert_eq!(target(Motion::Up, &s, None), None);
    }

    #[test]
    fn test_goto_lines() {
        let s = session("a\n  b\nc", Position::new(0, 0));
        let g = Motion::LastLine.evaluate(&s, None, None).unwrap();
        assert_eq!(g.position, Position::new(2, 0));
        assert_eq!(g.kind, MotionType::Linewise);
        assert_eq!(target(Motion::FirstLine, &s, Some(2)), Some(Position::new(1, 2)));
        assert_eq!(target(Motion::LastLine, &s, Some(99)), Some(Position::new(2, 0)));
    }

    #[test]
    fn test_find_and_repeat() {
        let mut s = session("a,b,c", Position::new(0, 0));
        let t = Motion::Find(FindKind::Forward)
            .evaluate(&s, None, Some(','))
            .unwrap();
        assert_eq!(t.position, Position::new(0, 1));
        assert_eq!(t.kind, MotionType::Inclusive);

        s.last_find = Some((FindKind::Forward, ','));
        s.buffer.set_cursor(Position::new(0, 1));
        assert_eq!(target(Motion::RepeatFind, &s, None), Some(Position::new(0, 3)));
        assert_eq!(target(Motion::RepeatFindReverse, &s, None), None);
    }

    #[test]
    fn test_line_end_with_count() {
        let s = session("abc\nlonger", Position::new(0, 0));
        assert_eq!(target(Motion::LineEnd, &s, None), Some(Position::new(0, 2)));
        assert_eq!(target(Motion::LineEnd, &s, Some(2)), Some(Position::new(1, 5)));
    }

    #[test]
    fn test_marks() {
        let mut s = session("one\n  two", Position::new(0, 0));
        assert_eq!(Motion::MarkExact.evaluate(&s, None, Some('a')), None);
        s.marks.set('a', Position::new(1, 3));
        assert_eq!(
            Motion::MarkExact.evaluate(&s, None, Some('a')).map(|t| t.position),
            Some(Position::new(1, 3))
        );
        assert_eq!(
            Motion::MarkLine.evaluate(&s, None, Some('a')).map(|t| t.position),
            Some(Position::new(1, 2))
        );
    }

    #[test]
    fn test_half_page() {
        let text = (0..30).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let s = session(&text, Position::new(0, 0));
        assert_eq!(target(Motion::HalfPageDown, &s, None), Some(Position::new(10, 0)));
        assert_eq!(target(Motion::HalfPageUp, &s, None), None);
    }

    #[test]
    fn test_change_word_target() {
        let buf = MemoryBuffer::from_text("foo bar");
        let t = change_word_target(&buf, Position::new(0, 0), false, 1);
        assert_eq!(t.position, Position::new(0, 2));
        let t = change_word_target(&buf, Position::new(0, 2), false, 1);
        assert_eq!(t.position, Position::new(0, 2));
        let t = change_word_target(&buf, Position::new(0, 0), false, 2);
        assert_eq!(t.position, Position::new(0, 6));
    }

    #[test]
    fn test_paragraph_object_is_linewise() {
        let buf = MemoryBuffer::from_text("a\nb\n\nc");
        let span = TextObject::Paragraph { around: false }
            .select(&buf, Position::new(1, 0))
            .unwrap();
        assert_eq!(span.kind, MotionType::Linewise);
        assert_eq!((span.start.line, span.end.line), (0, 1));
    }
}
