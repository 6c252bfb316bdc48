//! Error kinds for every layer of the engine.
//!
//! Registry errors are raised while building the action catalog or the Ex
//! command table and are fatal at startup. Everything else is recoverable: the
//! engine turns it into a status message and keeps accepting keys.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::mode::{Mode, ModeSet};

/// Misconfiguration detected while registering actions or Ex commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("key sequence `{pattern}` is registered twice for {modes:?}")]
    DuplicatePattern { pattern: String, modes: ModeSet },
    #[error("action pattern is empty")]
    EmptyPattern,
    #[error("Ex command `{0}` is registered twice")]
    DuplicateCommand(String),
    #[error("abbreviation `{abbreviation}` is not a prefix of `{name}`")]
    InvalidAbbreviation { name: String, abbreviation: String },
}

/// A mode change that the state machine does not allow.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot switch from {from} to {to}")]
pub struct ModeError {
    pub from: Mode,
    pub to: Mode,
}

/// An action matched but could not be carried out. Reported as feedback; the
/// pending keys are dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("motion failed")]
    MotionFailed,
    #[error("nothing in register {0}")]
    EmptyRegister(char),
    #[error("mark `{0}` is not set")]
    UnsetMark(char),
    #[error("invalid mark `{0}`")]
    InvalidMark(char),
    #[error("invalid register `{0}`")]
    InvalidRegister(char),
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// Malformed or unresolvable address range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("unterminated search pattern `{0}`")]
    UnterminatedPattern(String),
    #[error("empty search pattern")]
    EmptyPattern,
    #[error("expected a number, found `{0}`")]
    ExpectedNumber(String),
    #[error("invalid mark `{0}`")]
    InvalidMark(String),
    #[error("mark `{0}` is not set")]
    UnsetMark(char),
    #[error("invalid search pattern: {0}")]
    InvalidRegex(String),
    #[error("pattern not found: {0}")]
    PatternNotFound(String),
    #[error("line {line} is out of range (buffer has {count} lines)")]
    LineOutOfRange { line: i64, count: usize },
    #[error("backwards range: {start} comes after {end}")]
    Backwards { start: usize, end: usize },
}

/// Errors produced while parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("not an editor command: {0}")]
    UnknownCommand(String),
    #[error("ambiguous command `{input}`: could be {}", candidates.join(", "))]
    AmbiguousCommand {
        input: String,
        candidates: Vec<String>,
    },
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("trailing characters: {0}")]
    TrailingCharacters(String),
}

/// File collaborator failures.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("can't open file {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("{} is not valid UTF-8", .0.display())]
    InvalidUtf8(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::InvalidData => Self::InvalidUtf8(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Process collaborator failures.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with status {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("`{command}` was terminated by a signal{}", signal.map(|s| format!(" ({s})")).unwrap_or_default())]
    Signal { command: String, signal: Option<i32> },
}

/// Remap table failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemapError {
    #[error("mapping needs a non-empty key sequence")]
    EmptyKeys,
    #[error("no such mapping: {0}")]
    NoSuchMapping(String),
    #[error("recursive mapping exceeded {0} expansions")]
    RecursionLimit(usize),
}

/// Failures while executing an Ex command.
#[derive(Debug, Error)]
pub enum ExError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Remap(#[from] RemapError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("`{0}` needs a full editor integration")]
    Unsupported(&'static str),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid mapping `{lhs}`: {reason}")]
    InvalidMapping { lhs: String, reason: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
