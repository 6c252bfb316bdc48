//! Normal and Visual mode commands.

use crate::buffer::{Position, TextRange};
use crate::error::ActionError;
use crate::keys::Key;
use crate::mode::{Mode, VisualKind};
use crate::registers::{Marks, RegisterKind};
use crate::session::SessionState;

use super::operator::{self, Operator, OperatorRange};
use super::text;

/// Inputs collected by the dispatcher for the action being run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionArgs {
    pub count: Option<usize>,
    pub register: Option<char>,
    /// Character captured by a `{char}` placeholder.
    pub ch: Option<char>,
}

impl ActionArgs {
    pub fn count_or_one(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }

    fn ch(&self) -> Result<char, ActionError> {
        self.ch.ok_or(ActionError::MotionFailed)
    }
}

/// Follow-up work an action hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The command line was submitted with this text.
    Submit(String),
    /// Feed these keys through the dispatcher again (`.`).
    Replay(Vec<Key>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalCommand {
    /// `x`
    DeleteChar,
    /// `X`
    DeleteCharBefore,
    /// `D`
    DeleteToEnd,
    /// `C`
    ChangeToEnd,
    /// `Y`
    YankLine,
    /// `s`
    Substitute,
    /// `S`
    SubstituteLine,
    /// `r{char}`
    ReplaceChar,
    /// `J`
    JoinLines,
    /// `~`
    ToggleCase,
    PutAfter,
    PutBefore,
    Undo,
    Redo,
    Insert,
    Append,
    InsertLineStart,
    AppendLineEnd,
    OpenBelow,
    OpenAbove,
    Visual(VisualKind),
    /// `R`
    ReplaceMode,
    /// `:`
    CommandLine,
    /// `.`
    RepeatLastChange,
    /// `m{char}`
    SetMark,
    Escape,
}

impl NormalCommand {
    pub fn modifies(self) -> bool {
        !matches!(
            self,
            Self::YankLine
                | Self::Undo
                | Self::Redo
                | Self::Visual(_)
                | Self::CommandLine
                | Self::RepeatLastChange
                | Self::SetMark
                | Self::Escape
        )
    }

    pub fn execute(self, session: &mut SessionState, args: ActionArgs) -> Result<Effect, ActionError> {
        let n = args.count_or_one();
        let cursor = session.buffer.cursor();
        let len = session.buffer.line_len(cursor.line);
        let last_line = session.buffer.last_line();
        let through = (cursor.line + n - 1).min(last_line);

        let operate = |session: &mut SessionState, op: Operator, range: OperatorRange| {
            let mode = op.apply(session, range, args.register)?;
            session.set_mode(mode)?;
            Ok::<_, ActionError>(Effect::None)
        };
        let chars = |start: usize, end: usize| {
            OperatorRange::Chars(TextRange::new(
                Position::new(cursor.line, start),
                Position::new(cursor.line, end),
            ))
        };

        match self {
            Self::DeleteChar => {
                if len == 0 {
                    return Ok(Effect::None);
                }
                operate(session, Operator::Delete, chars(cursor.column, cursor.column + n))
            }
            Self::DeleteCharBefore => {
                if cursor.column == 0 {
                    return Ok(Effect::None);
                }
                let start = cursor.column - n.min(cursor.column);
                operate(session, Operator::Delete, chars(start, cursor.column))
            }
            Self::DeleteToEnd | Self::ChangeToEnd => {
                let range = OperatorRange::Chars(TextRange::new(
                    cursor,
                    Position::new(through, session.buffer.line_len(through)),
                ));
                let op = if self == Self::DeleteToEnd {
                    Operator::Delete
                } else {
                    Operator::Change
                };
                operate(session, op, range)
            }
            Self::YankLine => operate(
                session,
                Operator::Yank,
                OperatorRange::Lines {
                    first: cursor.line,
                    last: through,
                },
            ),
            Self::Substitute => operate(
                session,
                Operator::Change,
                chars(cursor.column, (cursor.column + n).min(len)),
            ),
            Self::SubstituteLine => operate(
                session,
                Operator::Change,
                OperatorRange::Lines {
                    first: cursor.line,
                    last: through,
                },
            ),
            Self::ReplaceChar => {
                operator::replace_chars(session.buffer.as_mut(), args.ch()?, n)?;
                Ok(Effect::None)
            }
            Self::JoinLines => {
                if operator::join_lines(session.buffer.as_mut(), cursor.line, n) {
                    Ok(Effect::None)
                } else {
                    Err(ActionError::MotionFailed)
                }
            }
            Self::ToggleCase => {
                operator::toggle_case_chars(session, n);
                Ok(Effect::None)
            }
            Self::PutAfter | Self::PutBefore => {
                operator::put(session, args.register, n, self == Self::PutBefore)?;
                Ok(Effect::None)
            }
            Self::Undo => {
                for _ in 0..n {
                    if !session.undo() {
                        session.info("Already at oldest change");
                        break;
                    }
                }
                Ok(Effect::None)
            }
            Self::Redo => {
                for _ in 0..n {
                    if !session.redo() {
                        session.info("Already at newest change");
                        break;
                    }
                }
                Ok(Effect::None)
            }
            Self::Insert
            | Self::Append
            | Self::InsertLineStart
            | Self::AppendLineEnd
            | Self::OpenBelow
            | Self::OpenAbove => {
                let buf = session.buffer.as_mut();
                let at = match self {
                    Self::Append if len > 0 => Position::new(cursor.line, cursor.column + 1),
                    Self::InsertLineStart => {
                        Position::new(cursor.line, text::first_non_blank(buf, cursor.line))
                    }
                    Self::AppendLineEnd => Position::new(cursor.line, len),
                    Self::OpenBelow => {
                        buf.insert_at(Position::new(cursor.line, len), "\n");
                        Position::new(cursor.line + 1, 0)
                    }
                    Self::OpenAbove => {
                        buf.insert_at(Position::new(cursor.line, 0), "\n");
                        Position::new(cursor.line, 0)
                    }
                    _ => cursor,
                };
                buf.set_cursor(at);
                session.set_mode(Mode::Insert)?;
                Ok(Effect::None)
            }
            Self::Visual(kind) => {
                session.visual_anchor = cursor;
                session.set_mode(Mode::Visual(kind))?;
                Ok(Effect::None)
            }
            Self::ReplaceMode => {
                session.replaced.clear();
                session.set_mode(Mode::Replace)?;
                Ok(Effect::None)
            }
            Self::CommandLine => {
                let prefill = match args.count {
                    None => String::new(),
                    Some(1) => ".".to_string(),
                    Some(n) => format!(".,.+{}", n - 1),
                };
                session.enter_command_line(&prefill)?;
                Ok(Effect::None)
            }
            Self::RepeatLastChange => Ok(Effect::Replay(session.last_change.clone())),
            Self::SetMark => {
                let name = args.ch()?;
                if !Marks::is_settable(name) && name != '\'' && name != '`' {
                    return Err(ActionError::InvalidMark(name));
                }
                session.marks.set(name, cursor);
                Ok(Effect::None)
            }
            Self::Escape => Ok(Effect::None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualCommand {
    Exit,
    /// `v`, `V`, `<C-v>`: switch selection kind, or leave if already in it.
    Switch(VisualKind),
    /// `o`
    SwapEnds,
    /// Run an operator over the selection.
    Apply(Operator),
    Join,
    /// Replace the selection with a register.
    Put,
    CommandLine,
}

impl VisualCommand {
    pub fn modifies(self) -> bool {
        match self {
            Self::Apply(op) => op.modifies(),
            Self::Join | Self::Put => true,
            _ => false,
        }
    }

    pub fn execute(self, session: &mut SessionState, args: ActionArgs) -> Result<Effect, ActionError> {
        let Mode::Visual(kind) = session.mode() else {
            return Ok(Effect::None);
        };
        match self {
            Self::Exit => {
                leave(session)?;
            }
            Self::Switch(to) if to == kind => {
                leave(session)?;
            }
            Self::Switch(to) => {
                session.set_mode(Mode::Visual(to))?;
            }
            Self::SwapEnds => {
                let cursor = session.buffer.cursor();
                let anchor = session.visual_anchor;
                session.visual_anchor = cursor;
                session.buffer.set_cursor(anchor);
            }
            Self::Apply(op) => {
                let range = selection(session, kind);
                remember_selection(session);
                let mode = op.apply(session, range, args.register)?;
                session.set_mode(mode)?;
            }
            Self::Join => {
                let range = selection(session, kind);
                leave(session)?;
                let (first, last) = match range {
                    OperatorRange::Chars(r) => (r.start.line, r.end.line),
                    OperatorRange::Lines { first, last } => (first, last),
                    OperatorRange::Block { top, bottom, .. } => (top, bottom),
                };
                operator::join_lines(session.buffer.as_mut(), first, last - first + 1);
            }
            Self::Put => put_over_selection(session, kind, args.register)?,
            Self::CommandLine => {
                remember_selection(session);
                session.enter_command_line("'<,'>")?;
            }
        }
        Ok(Effect::None)
    }
}

/// The operator range covered by the current selection.
pub fn selection(session: &SessionState, kind: VisualKind) -> OperatorRange {
    let anchor = session.visual_anchor;
    let cursor = session.buffer.cursor();
    let (start, end) = if anchor <= cursor {
        (anchor, cursor)
    } else {
        (cursor, anchor)
    };
    match kind {
        VisualKind::Char => OperatorRange::Chars(TextRange::new(
            start,
            session
                .buffer
                .clamp_position(Position::new(end.line, end.column + 1)),
        )),
        VisualKind::Line => OperatorRange::Lines {
            first: start.line,
            last: end.line,
        },
        VisualKind::Block => OperatorRange::Block {
            top: start.line,
            bottom: end.line,
            left: anchor.column.min(cursor.column),
            right: anchor.column.max(cursor.column),
        },
    }
}

/// Store the selection bounds in the `<` and `>` marks.
pub fn remember_selection(session: &mut SessionState) {
    let anchor = session.visual_anchor;
    let cursor = session.buffer.cursor();
    session.marks.set(Marks::VISUAL_START, anchor.min(cursor));
    session.marks.set(Marks::VISUAL_END, anchor.max(cursor));
}

fn leave(session: &mut SessionState) -> Result<(), ActionError> {
    remember_selection(session);
    session.set_mode(Mode::Normal)?;
    Ok(())
}

fn put_over_selection(
    session: &mut SessionState,
    kind: VisualKind,
    register: Option<char>,
) -> Result<(), ActionError> {
    let reg = session
        .registers
        .get(register)
        .filter(|r| !r.content.is_empty())
        .cloned()
        .ok_or(ActionError::EmptyRegister(register.unwrap_or('"')))?;
    let range = selection(session, kind);
    remember_selection(session);
    Operator::Delete.apply(session, range, None)?;
    session.set_mode(Mode::Normal)?;

    let buf = session.buffer.as_mut();
    match range {
        OperatorRange::Lines { first, .. } => {
            let mut content = reg.content;
            if !content.ends_with('\n') {
                content.push('\n');
            }
            if first <= buf.last_line() && !(buf.line_count() == 1 && buf.line_len(0) == 0) {
                operator::put_lines(buf, first, &content, true);
            } else {
                operator::put_lines(buf, first, &content, false);
                if buf.line_len(0) == 0 && buf.line_count() > 1 {
                    buf.delete_lines(0, 0);
                    buf.set_cursor(Position::new(0, 0));
                }
            }
        }
        OperatorRange::Chars(TextRange { start, .. }) => {
            let text = if reg.kind == RegisterKind::Linewise {
                format!("\n{}\n", reg.content.trim_end_matches('\n'))
            } else {
                reg.content
            };
            buf.insert_at(start, &text);
            buf.set_cursor(start);
        }
        OperatorRange::Block { top, left, .. } => {
            let start = Position::new(top, left);
            buf.insert_at(start, reg.content.trim_end_matches('\n'));
            buf.set_cursor(start);
        }
    }
    Ok(())
}
