use std::fmt;

use bitflags::bitflags;
use tracing::{debug, warn};

use crate::error::ModeError;

/// Flavour of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Char,
    Line,
    Block,
}

/// Editing modes, modeled after vim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Default mode. Motions, operators and commands.
    #[default]
    Normal,
    /// Text input. Entered with `i`, `a`, `o`, etc. Exited with `Esc`.
    Insert,
    /// Selection mode entered with `v`, `V` or `<C-v>`.
    Visual(VisualKind),
    /// Overwrite mode entered with `R`.
    Replace,
    /// Ex command line, entered with `:`.
    CommandLine,
    /// Transient sub-state of Normal: an operator waits for its motion.
    OperatorPending,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual(VisualKind::Char) => "VISUAL",
            Self::Visual(VisualKind::Line) => "V-LINE",
            Self::Visual(VisualKind::Block) => "V-BLOCK",
            Self::Replace => "REPLACE",
            Self::CommandLine => "COMMAND",
            Self::OperatorPending => "O-PENDING",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Visual(_))
    }

    /// Modes where typed characters become text.
    pub fn is_typing(&self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }

    /// The registry gate bit for this mode.
    pub fn mask(&self) -> ModeSet {
        match self {
            Self::Normal => ModeSet::NORMAL,
            Self::Insert => ModeSet::INSERT,
            Self::Visual(_) => ModeSet::VISUAL,
            Self::Replace => ModeSet::REPLACE,
            Self::CommandLine => ModeSet::COMMAND_LINE,
            Self::OperatorPending => ModeSet::OPERATOR_PENDING,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    /// A set of modes an action (or mapping) is valid in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeSet: u8 {
        const NORMAL = 1;
        const INSERT = 1 << 1;
        const VISUAL = 1 << 2;
        const REPLACE = 1 << 3;
        const COMMAND_LINE = 1 << 4;
        const OPERATOR_PENDING = 1 << 5;
    }
}

impl ModeSet {
    /// Where motions apply: moving the cursor, extending a selection, or
    /// completing an operator.
    pub const MOTION: Self = Self::NORMAL
        .union(Self::VISUAL)
        .union(Self::OPERATOR_PENDING);
    /// Scope of the plain `:map` family.
    pub const MAP: Self = Self::MOTION;
    /// Where a text object may follow.
    pub const SELECTION: Self = Self::VISUAL.union(Self::OPERATOR_PENDING);
}

/// Holds the current mode and enforces legal transitions.
///
/// Transitions are only ever requested by executing actions; raw keys never
/// switch modes directly.
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    current: Mode,
    /// Mode to return to when the command line closes.
    before_command_line: Option<Mode>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    /// The mode the command line was opened from, while it is open.
    pub fn command_line_origin(&self) -> Option<Mode> {
        self.before_command_line
    }

    pub fn is_legal(from: Mode, to: Mode) -> bool {
        use Mode::*;
        match (from, to) {
            (a, b) if a == b => true,
            // Only `enter_command_line`/`leave_command_line` touch these.
            (CommandLine, _) | (_, CommandLine) => false,
            (Normal, _) => true,
            (Insert | Replace, Normal) => true,
            (Visual(_), Normal | Visual(_) | Insert) => true,
            (OperatorPending, Normal | Insert) => true,
            _ => false,
        }
    }

    /// Switch to `to`, returning the previous mode.
    pub fn transition(&mut self, to: Mode) -> Result<Mode, ModeError> {
        let from = self.current;
        if !Self::is_legal(from, to) {
            warn!(%from, %to, "rejected mode transition");
            return Err(ModeError { from, to });
        }
        if from != to {
            debug!(%from, %to, "mode transition");
        }
        self.current = to;
        Ok(from)
    }

    pub fn enter_command_line(&mut self) -> Result<(), ModeError> {
        let from = self.current;
        if !matches!(from, Mode::Normal | Mode::Visual(_)) {
            warn!(%from, "command line can only open from normal or visual mode");
            return Err(ModeError {
                from,
                to: Mode::CommandLine,
            });
        }
        debug!(%from, "entering command line");
        self.before_command_line = Some(from);
        self.current = Mode::CommandLine;
        Ok(())
    }

    /// Close the command line (submitted or cancelled) and restore the mode
    /// it was opened from.
    pub fn leave_command_line(&mut self) -> Mode {
        let restored = self.before_command_line.take().unwrap_or_default();
        debug!(to = %restored, "leaving command line");
        self.current = restored;
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_normal() {
        assert_eq!(ModeMachine::new().current(), Mode::Normal);
    }

    #[test]
    fn test_command_line_returns_to_origin() {
        let mut machine = ModeMachine::new();
        machine
            .transition(Mode::Visual(VisualKind::Line))
            .unwrap();
        machine.enter_command_line().unwrap();
        assert_eq!(machine.current(), Mode::CommandLine);
        assert_eq!(
            machine.command_line_origin(),
            Some(Mode::Visual(VisualKind::Line))
        );
        assert_eq!(
            machine.leave_command_line(),
            Mode::Visual(VisualKind::Line)
        );
        assert_eq!(machine.command_line_origin(), None);
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        let mut machine = ModeMachine::new();
        machine.transition(Mode::Insert).unwrap();
        assert_eq!(
            machine.transition(Mode::Visual(VisualKind::Char)),
            Err(ModeError {
                from: Mode::Insert,
                to: Mode::Visual(VisualKind::Char)
            })
        );
        assert!(machine.enter_command_line().is_err());
        assert_eq!(machine.current(), Mode::Insert);
    }

    #[test]
    fn test_command_line_is_not_a_plain_transition() {
        let mut machine = ModeMachine::new();
        assert!(machine.transition(Mode::CommandLine).is_err());
    }

    #[test]
    fn test_mode_set_gates() {
        assert!(ModeSet::MOTION.contains(Mode::OperatorPending.mask()));
        assert!(ModeSet::MOTION.contains(Mode::Visual(VisualKind::Block).mask()));
        assert!(!ModeSet::MOTION.contains(Mode::Insert.mask()));
    }
}
