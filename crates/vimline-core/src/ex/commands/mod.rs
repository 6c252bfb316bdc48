//! Ex command handlers.
//!
//! Each command is built once from its parsed [`ExArgs`](super::ExArgs) and
//! then executed against the session. Building validates the argument text;
//! execution does the I/O and the edit.

pub mod lines;
pub mod listing;
pub mod mapping;
pub mod read;
pub mod write;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::actions::text;
use crate::buffer::Position;
use crate::error::ExError;
use crate::io::Environment;
use crate::registers::Marks;
use crate::session::SessionState;

use super::range::LineRange;

pub use lines::{LineCommand, PutCommand};
pub use mapping::{MapCommand, UnmapCommand};
pub use read::{ReadCommand, ReadSource};
pub use write::WriteCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    Read(ReadCommand),
    Write(WriteCommand),
    Delete(LineCommand),
    Yank(LineCommand),
    Put(PutCommand),
    Undo,
    Redo,
    /// List registers, optionally only the named ones.
    Registers(Option<String>),
    Marks,
    Map(MapCommand),
    Unmap(UnmapCommand),
    Quit,
    /// A range with no command name: jump to its last line.
    Goto(LineRange),
}

impl ExCommand {
    /// Whether the command may change the buffer and so needs an undo entry.
    pub fn modifies(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Delete(_) | Self::Put(_))
    }

    pub async fn execute(self, session: &mut SessionState, env: &Environment) -> Result<(), ExError> {
        debug!(command = ?self, "executing Ex command");
        match self {
            Self::Read(cmd) => cmd.execute(session, env).await,
            Self::Write(cmd) => cmd.execute(session, env).await,
            Self::Delete(cmd) => cmd.delete(session),
            Self::Yank(cmd) => cmd.yank(session),
            Self::Put(cmd) => cmd.execute(session),
            Self::Undo => {
                if !session.undo() {
                    session.info("Already at oldest change");
                }
                Ok(())
            }
            Self::Redo => {
                if !session.redo() {
                    session.info("Already at newest change");
                }
                Ok(())
            }
            Self::Registers(filter) => {
                listing::show_registers(session, filter.as_deref());
                Ok(())
            }
            Self::Marks => {
                listing::show_marks(session);
                Ok(())
            }
            Self::Map(cmd) => cmd.execute(session),
            Self::Unmap(cmd) => cmd.execute(session),
            Self::Quit => {
                session.quit_requested = true;
                Ok(())
            }
            Self::Goto(range) => goto(session, &range),
        }
    }
}

fn goto(session: &mut SessionState, range: &LineRange) -> Result<(), ExError> {
    let (_, end) = range.resolve(session.buffer.as_ref(), &session.marks)?;
    let line = end.max(1) - 1;
    let cursor = session.buffer.cursor();
    session.marks.set(Marks::PREVIOUS, cursor);
    let column = text::first_non_blank(session.buffer.as_ref(), line);
    session.buffer.set_cursor(Position::new(line, column));
    Ok(())
}

/// Relative paths are taken from the session's working directory.
fn absolute(session: &SessionState, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match session.working_directory() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
