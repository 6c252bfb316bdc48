//! The action registry.
//!
//! Every motion, operator and command is declared as a key pattern plus the
//! set of modes it is valid in. The dispatcher asks the registry whether the
//! keys typed so far match exactly, could still match, or never will.

pub mod cmdline;
pub mod command;
pub mod defaults;
pub mod insert;
pub mod motion;
pub mod operator;
pub mod text;

use std::fmt;

use tracing::debug;

use crate::error::RegistryError;
use crate::keys::{parse_keys, Key};
use crate::mode::{Mode, ModeSet};

pub use cmdline::LineEditCommand;
pub use command::{NormalCommand, VisualCommand};
pub use insert::InsertCommand;
pub use motion::{FindKind, Motion, MotionType, TextObject};
pub use operator::{Operator, OperatorRange};

/// Placeholder, in pattern notation, for any single printable key.
pub const CHAR_PLACEHOLDER: &str = "{char}";

/// One element of a key pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKey {
    Key(Key),
    /// Any key that types a character; the character is captured.
    AnyChar,
}

impl PatternKey {
    fn capture(&self, key: &Key) -> Option<Option<char>> {
        match self {
            Self::Key(expected) => (expected == key).then_some(None),
            Self::AnyChar => key.as_char().map(Some),
        }
    }
}

/// A key sequence an action answers to, e.g. `dd`, `<C-r>`, `f{char}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern(Vec<PatternKey>);

impl KeyPattern {
    pub fn parse(notation: &str) -> Self {
        let mut elements = Vec::new();
        for (i, part) in notation.split(CHAR_PLACEHOLDER).enumerate() {
            if i > 0 {
                elements.push(PatternKey::AnyChar);
            }
            elements.extend(parse_keys(part).into_iter().map(PatternKey::Key));
        }
        Self(elements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn wildcards(&self) -> usize {
        self.0
            .iter()
            .filter(|k| matches!(k, PatternKey::AnyChar))
            .count()
    }

    fn match_keys(&self, keys: &[Key]) -> PatternMatch {
        if keys.len() > self.0.len() {
            return PatternMatch::None;
        }
        let mut captured = Vec::new();
        for (element, key) in self.0.iter().zip(keys) {
            match element.capture(key) {
                Some(Some(c)) => captured.push(c),
                Some(None) => {}
                None => return PatternMatch::None,
            }
        }
        if keys.len() == self.0.len() {
            PatternMatch::Exact(captured)
        } else {
            PatternMatch::Prefix {
                wants_char: matches!(self.0[keys.len()], PatternKey::AnyChar),
            }
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.0 {
            match element {
                PatternKey::Key(key) => write!(f, "{key}")?,
                PatternKey::AnyChar => f.write_str(CHAR_PLACEHOLDER)?,
            }
        }
        Ok(())
    }
}

enum PatternMatch {
    Exact(Vec<char>),
    Prefix { wants_char: bool },
    None,
}

/// What a matched key sequence does.
///
/// Operators do not act alone: once matched in Normal mode they wait in
/// Operator-pending mode and run over the range of the motion or text object
/// that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Motion(Motion),
    TextObject(TextObject),
    Operator(Operator),
    Normal(NormalCommand),
    Visual(VisualCommand),
    Insert(InsertCommand),
    LineEdit(LineEditCommand),
}

impl Action {
    /// Whether running the action can change buffer text.
    pub fn may_modify(&self) -> bool {
        match self {
            Self::Motion(_) | Self::TextObject(_) | Self::LineEdit(_) => false,
            Self::Operator(op) => op.modifies(),
            Self::Normal(cmd) => cmd.modifies(),
            Self::Visual(cmd) => cmd.modifies(),
            Self::Insert(_) => true,
        }
    }
}

/// A registry entry.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub pattern: KeyPattern,
    pub modes: ModeSet,
    pub action: Action,
    /// Replayed by `.` when it completes a change.
    pub repeatable: bool,
}

impl ActionSpec {
    pub fn new(notation: &str, modes: ModeSet, action: Action) -> Self {
        Self {
            pattern: KeyPattern::parse(notation),
            modes,
            action,
            repeatable: false,
        }
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

/// Outcome of matching pending keys against the registry.
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A pattern matched completely. `chars` holds what `{char}` captured.
    Exact { spec: &'a ActionSpec, chars: Vec<char> },
    /// The keys start at least one pattern; wait for more.
    /// `wants_char` is set when every such pattern expects a `{char}` next.
    Prefix { wants_char: bool },
    None,
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    specs: Vec<ActionSpec>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        defaults::register_defaults(&mut registry)?;
        debug!(actions = registry.len(), "action registry built");
        Ok(registry)
    }

    /// Add an action. Two actions may not share a pattern in any mode.
    pub fn register(&mut self, spec: ActionSpec) -> Result<(), RegistryError> {
        if spec.pattern.is_empty() {
            return Err(RegistryError::EmptyPattern);
        }
        if let Some(existing) = self
            .specs
            .iter()
            .find(|s| s.pattern == spec.pattern && s.modes.intersects(spec.modes))
        {
            return Err(RegistryError::DuplicatePattern {
                pattern: spec.pattern.to_string(),
                modes: existing.modes & spec.modes,
            });
        }
        self.specs.push(spec);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Match `keys` against the actions valid in `mode`.
    ///
    /// An exact match wins over a longer pattern the keys are a prefix of.
    /// Among exact matches, the one with fewer `{char}` placeholders wins.
    pub fn lookup(&self, mode: Mode, keys: &[Key]) -> Lookup<'_> {
        let gate = mode.mask();
        let mut exact: Option<(&ActionSpec, Vec<char>)> = None;
        let mut prefix = false;
        let mut all_want_char = true;

        for spec in self.specs.iter().filter(|s| s.modes.contains(gate)) {
            match spec.pattern.match_keys(keys) {
                PatternMatch::Exact(chars) => {
                    let better = exact.as_ref().is_none_or(|(best, _)| {
                        spec.pattern.wildcards() < best.pattern.wildcards()
                    });
                    if better {
                        exact = Some((spec, chars));
                    }
                }
                PatternMatch::Prefix { wants_char } => {
                    prefix = true;
                    all_want_char &= wants_char;
                }
                PatternMatch::None => {}
            }
        }

        match exact {
            Some((spec, chars)) => Lookup::Exact { spec, chars },
            None if prefix => Lookup::Prefix {
                wants_char: all_want_char,
            },
            None => Lookup::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(notation: &str, motion: Motion) -> ActionSpec {
        ActionSpec::new(notation, ModeSet::MOTION, Action::Motion(motion))
    }

    #[test]
    fn test_pattern_with_placeholder() {
        let pattern = KeyPattern::parse("f{char}");
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.to_string(), "f{char}");
        assert!(matches!(
            pattern.match_keys(&parse_keys("fx")),
            PatternMatch::Exact(ref c) if c == &['x']
        ));
        assert!(matches!(
            pattern.match_keys(&parse_keys("f")),
            PatternMatch::Prefix { wants_char: true }
        ));
        assert!(matches!(
            pattern.match_keys(&parse_keys("f<Esc>")),
            PatternMatch::None
        ));
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let mut registry = ActionRegistry::new();
        registry.register(motion("w", Motion::WordForward { big: false })).unwrap();
        let err = registry
            .register(ActionSpec::new(
                "w",
                ModeSet::NORMAL,
                Action::Normal(NormalCommand::Insert),
            ))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicatePattern {
                pattern: "w".into(),
                modes: ModeSet::NORMAL
            }
        );
    }

    #[test]
    fn test_same_pattern_in_disjoint_modes() {
        let mut registry = ActionRegistry::new();
        registry
            .register(ActionSpec::new(
                "d",
                ModeSet::NORMAL,
                Action::Operator(Operator::Delete),
            ))
            .unwrap();
        registry
            .register(ActionSpec::new(
                "d",
                ModeSet::VISUAL,
                Action::Visual(VisualCommand::Apply(Operator::Delete)),
            ))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let mut registry = ActionRegistry::new();
        assert_eq!(
            registry.register(motion("", Motion::Left)).unwrap_err(),
            RegistryError::EmptyPattern
        );
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let mut registry = ActionRegistry::new();
        registry.register(motion("g", Motion::FirstLine)).unwrap();
        registry.register(motion("gg", Motion::LastLine)).unwrap();
        match registry.lookup(Mode::Normal, &parse_keys("g")) {
            Lookup::Exact { spec, .. } => assert_eq!(spec.action, Action::Motion(Motion::FirstLine)),
            other => panic!("expected exact match, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_is_gated_by_mode() {
        let mut registry = ActionRegistry::new();
        registry
            .register(ActionSpec::new(
                "x",
                ModeSet::NORMAL,
                Action::Normal(NormalCommand::DeleteChar),
            ))
            .unwrap();
        assert!(matches!(
            registry.lookup(Mode::Normal, &parse_keys("x")),
            Lookup::Exact { .. }
        ));
        assert!(matches!(
            registry.lookup(Mode::Visual(crate::mode::VisualKind::Char), &parse_keys("x")),
            Lookup::None
        ));
    }

    #[test]
    fn test_concrete_key_beats_placeholder() {
        let mut registry = ActionRegistry::new();
        registry
            .register(ActionSpec::new(
                "{char}",
                ModeSet::INSERT,
                Action::Insert(InsertCommand::Char),
            ))
            .unwrap();
        registry
            .register(ActionSpec::new(
                "<Tab>",
                ModeSet::INSERT,
                Action::Insert(InsertCommand::Tab),
            ))
            .unwrap();
        match registry.lookup(Mode::Insert, &parse_keys("<Tab>")) {
            Lookup::Exact { spec, chars } => {
                assert_eq!(spec.action, Action::Insert(InsertCommand::Tab));
                assert!(chars.is_empty());
            }
            other => panic!("expected exact match, got {other:?}"),
        }
    }

    #[test]
    fn test_default_catalog_registers_cleanly() {
        let registry = ActionRegistry::with_defaults().unwrap();
        assert!(registry.len() > 100);
        assert!(matches!(
            registry.lookup(Mode::OperatorPending, &parse_keys("i")),
            Lookup::Prefix { wants_char: false }
        ));
        assert!(matches!(
            registry.lookup(Mode::Normal, &parse_keys("f")),
            Lookup::Prefix { wants_char: true }
        ));
    }
}
