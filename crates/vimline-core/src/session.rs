//! Per-document editing session.
//!
//! [`SessionState`] is the one mutable context threaded through every action
//! and Ex command. Nothing in the engine keeps state anywhere else.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::actions::motion::FindKind;
use crate::buffer::{Position, TextBuffer};
use crate::error::ModeError;
use crate::history::History;
use crate::keys::Key;
use crate::mode::{Mode, ModeMachine};
use crate::recorded::RecordedState;
use crate::registers::{Marks, Registers};
use crate::remap::RemapTable;

/// How much of a host editor is behind the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostIntegration {
    /// A host that can save, close and otherwise manage documents.
    #[default]
    Full,
    /// Only a text buffer: commands that need the host are refused.
    Headless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether `:read !cmd` may run shell commands.
    pub shell_commands: bool,
    pub host: HostIntegration,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            shell_commands: true,
            host: HostIntegration::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Lines moved by `<C-d>` and `<C-u>`.
    pub scroll: usize,
    pub shiftwidth: usize,
    pub undo_levels: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scroll: 10,
            shiftwidth: 4,
            undo_levels: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Feedback for the user, shown by the host in its status area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
}

/// Text typed on the Ex command line. `cursor` counts characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub text: String,
    pub cursor: usize,
}

impl CommandLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Everything a host needs to draw its status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub mode: &'static str,
    pub pending: String,
    pub command_line: Option<CommandLine>,
    pub message: Option<Message>,
    pub cursor: Position,
}

pub struct SessionState {
    modes: ModeMachine,
    pub buffer: Box<dyn TextBuffer>,
    pub registers: Registers,
    pub marks: Marks,
    pub recorded: RecordedState,
    pub remaps: RemapTable,
    pub history: History,
    pub command_line: CommandLine,
    pub options: Options,
    pub capabilities: Capabilities,
    /// Open workspace folders, first one preferred.
    pub workspace_roots: Vec<PathBuf>,
    /// The fixed end of the visual selection; the cursor is the other end.
    pub visual_anchor: Position,
    /// Column vertical motions try to keep.
    pub desired_column: Option<usize>,
    pub last_find: Option<(FindKind, char)>,
    /// Keys of the last change, replayed by `.`.
    pub last_change: Vec<Key>,
    /// Keys of a change still in progress (an Insert session it opened).
    pub change_recording: Option<Vec<Key>>,
    pub replaying: bool,
    /// Characters overwritten in the current Replace session, restored by
    /// `<BS>`. `None` marks a character that was appended.
    pub replaced: Vec<Option<char>>,
    pub message: Option<Message>,
    pub quit_requested: bool,
}

impl SessionState {
    pub fn new(buffer: Box<dyn TextBuffer>) -> Self {
        let options = Options::default();
        Self {
            modes: ModeMachine::new(),
            buffer,
            registers: Registers::new(),
            marks: Marks::default(),
            recorded: RecordedState::default(),
            remaps: RemapTable::new(),
            history: History::new(options.undo_levels),
            command_line: CommandLine::default(),
            options,
            capabilities: Capabilities::default(),
            workspace_roots: Vec::new(),
            visual_anchor: Position::default(),
            desired_column: None,
            last_find: None,
            last_change: Vec::new(),
            change_recording: None,
            replaying: false,
            replaced: Vec::new(),
            message: None,
            quit_requested: false,
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.history = History::new(options.undo_levels);
        self.options = options;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_roots.push(root.into());
        self
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn set_mode(&mut self, to: Mode) -> Result<Mode, ModeError> {
        self.modes.transition(to)
    }

    /// Drop back to Normal mode after an action ends or fails.
    pub fn return_to_normal(&mut self) {
        if let Err(err) = self.modes.transition(Mode::Normal) {
            warn!(%err, "could not return to normal mode");
        }
    }

    pub fn enter_command_line(&mut self, prefill: &str) -> Result<(), ModeError> {
        self.modes.enter_command_line()?;
        self.command_line.set(prefill);
        Ok(())
    }

    /// Close the command line and return what was typed on it.
    pub fn leave_command_line(&mut self) -> String {
        self.modes.leave_command_line();
        self.command_line.take()
    }

    pub fn command_line_origin(&self) -> Option<Mode> {
        self.modes.command_line_origin()
    }

    /// Where shell commands run: the first workspace root, else the
    /// directory of the document if it lives on disk.
    pub fn working_directory(&self) -> Option<PathBuf> {
        if let Some(root) = self.workspace_roots.first() {
            return Some(root.clone());
        }
        self.buffer
            .path()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            severity: Severity::Info,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(%text, "error feedback");
        self.message = Some(Message {
            text,
            severity: Severity::Error,
        });
    }

    pub fn begin_change(&mut self) {
        let snapshot = self.buffer.snapshot();
        self.history.begin(snapshot);
    }

    pub fn commit_change(&mut self) -> bool {
        let snapshot = self.buffer.snapshot();
        self.history.commit(&snapshot)
    }

    pub fn undo(&mut self) -> bool {
        let current = self.buffer.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.buffer.restore(&previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.buffer.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.buffer.restore(&next);
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> StatusLine {
        StatusLine {
            mode: self.mode().label(),
            pending: self.recorded.display(),
            command_line: (self.mode() == Mode::CommandLine).then(|| self.command_line.clone()),
            message: self.message.clone(),
            cursor: self.buffer.cursor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    #[test]
    fn test_working_directory_prefers_workspace_root() {
        let buffer = MemoryBuffer::from_text("").with_path("/docs/notes/todo.txt");
        let session = SessionState::new(Box::new(buffer)).with_workspace_root("/work");
        assert_eq!(session.working_directory(), Some(PathBuf::from("/work")));
    }

    #[test]
    fn test_working_directory_falls_back_to_document() {
        let buffer = MemoryBuffer::from_text("").with_path("/docs/notes/todo.txt");
        let session = SessionState::new(Box::new(buffer));
        assert_eq!(
            session.working_directory(),
            Some(PathBuf::from("/docs/notes"))
        );
    }

    #[test]
    fn test_working_directory_unset_for_untitled() {
        let session = SessionState::new(Box::new(MemoryBuffer::new()));
        assert_eq!(session.working_directory(), None);

        let relative = MemoryBuffer::new().with_path("scratch.txt");
        let session = SessionState::new(Box::new(relative));
        assert_eq!(session.working_directory(), None);
    }

    #[test]
    fn test_undo_redo_through_session() {
        let mut session = SessionState::new(Box::new(MemoryBuffer::from_text("abc")));
        session.begin_change();
        session.buffer.insert_at(Position::new(0, 3), "def");
        assert!(session.commit_change());
        assert!(session.undo());
        assert_eq!(session.buffer.text(), "abc");
        assert!(session.redo());
        assert_eq!(session.buffer.text(), "abcdef");
        assert!(!session.redo());
    }

    #[test]
    fn test_status_shows_command_line_only_when_open() {
        let mut session = SessionState::new(Box::new(MemoryBuffer::new()));
        assert_eq!(session.status().command_line, None);
        session.enter_command_line("'<,'>").unwrap();
        let status = session.status();
        assert_eq!(status.mode, "COMMAND");
        assert_eq!(status.command_line.unwrap().text, "'<,'>");
        assert_eq!(session.leave_command_line(), "'<,'>");
        assert_eq!(session.mode(), Mode::Normal);
    }

    #[test]
    fn test_return_to_normal_keeps_command_line_open() {
        let mut session = SessionState::new(Box::new(MemoryBuffer::new()));
        session.set_mode(Mode::Insert).unwrap();
        session.return_to_normal();
        assert_eq!(session.mode(), Mode::Normal);

        session.enter_command_line("").unwrap();
        session.return_to_normal();
        assert_eq!(session.mode(), Mode::CommandLine);
    }
}
