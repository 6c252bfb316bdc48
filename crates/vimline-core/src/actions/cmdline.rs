//! Editing keys for the Ex command line.

use crate::error::ActionError;
use crate::session::{CommandLine, SessionState};

use super::command::{ActionArgs, Effect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEditCommand {
    /// `<Esc>`, `<C-c>`
    Cancel,
    /// `<CR>`
    Submit,
    /// `<BS>`: on an empty line, cancels.
    Backspace,
    /// `<C-w>`
    DeleteWord,
    /// `<C-u>`: delete everything before the cursor.
    Clear,
    /// `<C-r>{char}`
    InsertRegister,
    Left,
    Right,
    Home,
    End,
    Char,
}

impl LineEditCommand {
    pub fn execute(self, session: &mut SessionState, args: ActionArgs) -> Result<Effect, ActionError> {
        let line = &mut session.command_line;
        match self {
            Self::Cancel => {
                session.leave_command_line();
            }
            Self::Submit => return Ok(Effect::Submit(session.leave_command_line())),
            Self::Backspace if line.text.is_empty() => {
                session.leave_command_line();
            }
            Self::Backspace => {
                if line.cursor > 0 {
                    remove(line, line.cursor - 1, line.cursor);
                }
            }
            Self::DeleteWord => {
                let chars: Vec<char> = line.text.chars().collect();
                let mut start = line.cursor.min(chars.len());
                while start > 0 && chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                let word = start > 0 && is_word(chars[start - 1]);
                while start > 0 && !chars[start - 1].is_whitespace() && is_word(chars[start - 1]) == word {
                    start -= 1;
                }
                remove(line, start, line.cursor);
            }
            Self::Clear => remove(line, 0, line.cursor),
            Self::InsertRegister => {
                let name = args.ch.ok_or(ActionError::MotionFailed)?;
                let content = session
                    .registers
                    .get(Some(name))
                    .map(|r| r.content.trim_end_matches('\n').replace('\n', " "))
                    .filter(|c| !c.is_empty())
                    .ok_or(ActionError::EmptyRegister(name))?;
                insert(&mut session.command_line, &content);
            }
            Self::Left => line.cursor = line.cursor.saturating_sub(1),
            Self::Right => line.cursor = (line.cursor + 1).min(line.text.chars().count()),
            Self::Home => line.cursor = 0,
            Self::End => line.cursor = line.text.chars().count(),
            Self::Char => {
                let ch = args.ch.ok_or(ActionError::MotionFailed)?;
                insert(line, ch.encode_utf8(&mut [0; 4]));
            }
        }
        Ok(Effect::None)
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn byte_index(text: &str, column: usize) -> usize {
    text.char_indices().nth(column).map_or(text.len(), |(i, _)| i)
}

fn insert(line: &mut CommandLine, s: &str) {
    let at = byte_index(&line.text, line.cursor);
    line.text.insert_str(at, s);
    line.cursor += s.chars().count();
}

fn remove(line: &mut CommandLine, from: usize, to: usize) {
    let start = byte_index(&line.text, from);
    let end = byte_index(&line.text, to);
    line.text.replace_range(start..end, "");
    line.cursor = from;
}
