//! Insert and Replace mode commands.

use crate::buffer::{advance, Position, TextRange};
use crate::error::ActionError;
use crate::mode::Mode;
use crate::session::SessionState;

use super::command::{ActionArgs, Effect};
use super::motion::Motion;
use super::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertCommand {
    /// `<Esc>`: back to Normal, cursor one left.
    Exit,
    /// `<CR>`
    Newline,
    /// `<BS>`
    Backspace,
    /// `<Del>`
    Delete,
    /// `<Tab>`
    Tab,
    /// `<C-w>`: delete the word before the cursor.
    DeleteWord,
    /// `<C-u>`: delete everything before the cursor on the line.
    DeleteLine,
    /// `<C-r>{char}`: insert a register.
    InsertRegister,
    /// Arrow keys, `<Home>`, `<End>`.
    Move(Motion),
    /// Any printable key.
    Char,
}

impl InsertCommand {
    pub fn execute(self, session: &mut SessionState, args: ActionArgs) -> Result<Effect, ActionError> {
        let replacing = session.mode() == Mode::Replace;
        let cursor = session.buffer.cursor();
        let len = session.buffer.line_len(cursor.line);

        match self {
            Self::Exit => {
                session.set_mode(Mode::Normal)?;
                session.replaced.clear();
                if cursor.column > 0 {
                    session
                        .buffer
                        .set_cursor(Position::new(cursor.line, cursor.column - 1));
                }
            }
            Self::Char => {
                let ch = args.ch.ok_or(ActionError::MotionFailed)?;
                type_text(session, &ch.to_string(), replacing);
            }
            Self::Tab => type_text(session, "\t", replacing),
            Self::Newline => {
                session.buffer.insert_at(cursor, "\n");
                session.buffer.set_cursor(Position::new(cursor.line + 1, 0));
            }
            Self::Backspace if replacing => {
                if cursor.column == 0 {
                    return Ok(Effect::None);
                }
                let before = Position::new(cursor.line, cursor.column - 1);
                let range = TextRange::new(before, cursor);
                match session.replaced.pop() {
                    Some(Some(original)) => {
                        session.buffer.replace_range(range, &original.to_string());
                    }
                    Some(None) => {
                        session.buffer.delete_range(range);
                    }
                    // Nothing typed in this session left to take back.
                    None => {}
                }
                session.buffer.set_cursor(before);
            }
            Self::Backspace => {
                if cursor.column > 0 {
                    let before = Position::new(cursor.line, cursor.column - 1);
                    session.buffer.delete_range(TextRange::new(before, cursor));
                    session.buffer.set_cursor(before);
                } else if cursor.line > 0 {
                    let above = cursor.line - 1;
                    let end = Position::new(above, session.buffer.line_len(above));
                    session.buffer.delete_range(TextRange::new(end, cursor));
                    session.buffer.set_cursor(end);
                }
            }
            Self::Delete => {
                let buf = session.buffer.as_mut();
                if cursor.column < len {
                    buf.delete_range(TextRange::new(
                        cursor,
                        Position::new(cursor.line, cursor.column + 1),
                    ));
                } else if cursor.line < buf.last_line() {
                    buf.delete_range(TextRange::new(cursor, Position::new(cursor.line + 1, 0)));
                }
                buf.set_cursor(cursor);
            }
            Self::DeleteWord | Self::DeleteLine => {
                if cursor.column == 0 {
                    return Self::Backspace.execute(session, args);
                }
                let buf = session.buffer.as_mut();
                let start = if self == Self::DeleteLine {
                    0
                } else {
                    let back = text::word_backward(buf, cursor, false);
                    if back.line == cursor.line { back.column } else { 0 }
                };
                let from = Position::new(cursor.line, start);
                buf.delete_range(TextRange::new(from, cursor));
                buf.set_cursor(from);
            }
            Self::InsertRegister => {
                let name = args.ch.ok_or(ActionError::MotionFailed)?;
                let content = session
                    .registers
                    .get(Some(name))
                    .map(|r| r.content.clone())
                    .filter(|c| !c.is_empty())
                    .ok_or(ActionError::EmptyRegister(name))?;
                session.buffer.insert_at(cursor, &content);
                session.buffer.set_cursor(advance(cursor, &content));
            }
            Self::Move(motion) => {
                if let Some(target) = motion.evaluate(session, None, None) {
                    session.buffer.set_cursor(target.position);
                }
            }
        }
        Ok(Effect::None)
    }
}

/// Type `s` at the cursor. In Replace mode characters under the cursor are
/// overwritten and remembered so `<BS>` can put them back.
fn type_text(session: &mut SessionState, s: &str, replacing: bool) {
    let mut cursor = session.buffer.cursor();
    for c in s.chars() {
        let here = Position::new(cursor.line, cursor.column + 1);
        let original = replacing
            .then(|| text::char_at(session.buffer.as_ref(), cursor))
            .flatten();
        match original {
            Some(original) => {
                session
                    .buffer
                    .replace_range(TextRange::new(cursor, here), &c.to_string());
                session.replaced.push(Some(original));
            }
            None => {
                session.buffer.insert_at(cursor, &c.to_string());
                if replacing {
                    session.replaced.push(None);
                }
            }
        }
        cursor = here;
    }
    session.buffer.set_cursor(cursor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{MemoryBuffer, TextBuffer};
    use pretty_assertions::assert_eq;

    fn session(text: &str, cursor: Position, mode: Mode) -> SessionState {
        let mut buf = MemoryBuffer::from_text(text);
        buf.set_cursor(cursor);
        let mut s = SessionState::new(Box::new(buf));
        s.set_mode(mode).unwrap();
        s
    }

    fn pos(line: usize, column: usize) -> Position {
        Position::new(line, column)
    }

    fn ch(c: char) -> ActionArgs {
        ActionArgs {
            ch: Some(c),
            ..Default::default()
        }
    }

    fn run(s: &mut SessionState, cmd: InsertCommand) {
        cmd.execute(s, ActionArgs::default()).unwrap();
    }

    #[test]
    fn test_typing_and_exit() {
        let mut s = session("ac", pos(0, 1), Mode::Insert);
        InsertCommand::Char.execute(&mut s, ch('b')).unwrap();
        assert_eq!(s.buffer.text(), "abc");
        assert_eq!(s.buffer.cursor(), pos(0, 2));
        run(&mut s, InsertCommand::Exit);
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.buffer.cursor(), pos(0, 1));
    }

    #[test]
    fn test_newline_and_backspace_join() {
        let mut s = session("abcd", pos(0, 2), Mode::Insert);
        run(&mut s, InsertCommand::Newline);
        assert_eq!(s.buffer.text(), "ab\ncd");
        assert_eq!(s.buffer.cursor(), pos(1, 0));
        run(&mut s, InsertCommand::Backspace);
        assert_eq!(s.buffer.text(), "abcd");
        assert_eq!(s.buffer.cursor(), pos(0, 2));
    }

    #[test]
    fn test_delete_joins_at_line_end() {
        let mut s = session("ab\ncd", pos(0, 2), Mode::Insert);
        run(&mut s, InsertCommand::Delete);
        assert_eq!(s.buffer.text(), "abcd");
    }

    #[test]
    fn test_ctrl_w_and_ctrl_u() {
        let mut s = session("foo bar baz", pos(0, 11), Mode::Insert);
        run(&mut s, InsertCommand::DeleteWord);
        assert_eq!(s.buffer.text(), "foo bar ");
        run(&mut s, InsertCommand::DeleteLine);
        assert_eq!(s.buffer.text(), "");
        assert_eq!(s.buffer.cursor(), pos(0, 0));
    }

    #[test]
    fn test_replace_mode_backspace_restores() {
        let mut s = session("abc", pos(0, 1), Mode::Replace);
        for c in ['X', 'Y', 'Z'] {
            InsertCommand::Char.execute(&mut s, ch(c)).unwrap();
        }
        assert_eq!(s.buffer.text(), "aXYZ");
        run(&mut s, InsertCommand::Backspace);
        assert_eq!(s.buffer.text(), "aXY");
        run(&mut s, InsertCommand::Backspace);
        run(&mut s, InsertCommand::Backspace);
        assert_eq!(s.buffer.text(), "abc");
        assert_eq!(s.buffer.cursor(), pos(0, 1));
        run(&mut s, InsertCommand::Backspace);
        assert_eq!(s.buffer.text(), "abc");
        assert_eq!(s.buffer.cursor(), pos(0, 0));
    }

    #[test]
    fn test_insert_register() {
        let mut s = session("[]", pos(0, 1), Mode::Insert);
        s.registers
            .store_yank(Some('a'), crate::registers::Register::charwise("xy"));
        InsertCommand::InsertRegister.execute(&mut s, ch('a')).unwrap();
        assert_eq!(s.buffer.text(), "[xy]");
        assert_eq!(s.buffer.cursor(), pos(0, 3));
        assert_eq!(
            InsertCommand::InsertRegister.execute(&mut s, ch('q')),
            Err(ActionError::EmptyRegister('q'))
        );
    }

    #[test]
    fn test_end_key_moves_past_last_char() {
        let mut s = session("abc", pos(0, 0), Mode::Insert);
        run(&mut s, InsertCommand::Move(Motion::InsertLineEnd));
        assert_eq!(s.buffer.cursor(), pos(0, 3));
    }
}
