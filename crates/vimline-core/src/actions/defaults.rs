//! The built-in action catalog.

use crate::error::RegistryError;
use crate::mode::{ModeSet, VisualKind};

use super::{
    Action, ActionRegistry, ActionSpec, FindKind, InsertCommand, LineEditCommand, Motion,
    NormalCommand, Operator, TextObject, VisualCommand,
};

const MOTIONS: &[(&str, Motion)] = &[
    ("h", Motion::Left),
    ("<Left>", Motion::Left),
    ("<BS>", Motion::Left),
    ("l", Motion::Right),
    ("<Right>", Motion::Right),
    ("k", Motion::Up),
    ("<Up>", Motion::Up),
    ("j", Motion::Down),
    ("<Down>", Motion::Down),
    ("<Space>", Motion::SpaceRight),
    ("w", Motion::WordForward { big: false }),
    ("W", Motion::WordForward { big: true }),
    ("b", Motion::WordBackward { big: false }),
    ("B", Motion::WordBackward { big: true }),
    ("e", Motion::WordEnd { big: false }),
    ("E", Motion::WordEnd { big: true }),
    ("0", Motion::LineStart),
    ("<Home>", Motion::LineStart),
    ("^", Motion::FirstNonBlank),
    ("$", Motion::LineEnd),
    ("<End>", Motion::LineEnd),
    ("gg", Motion::FirstLine),
    ("G", Motion::LastLine),
    ("f{char}", Motion::Find(FindKind::Forward)),
    ("F{char}", Motion::Find(FindKind::Backward)),
    ("t{char}", Motion::Find(FindKind::TillForward)),
    ("T{char}", Motion::Find(FindKind::TillBackward)),
    (";", Motion::RepeatFind),
    (",", Motion::RepeatFindReverse),
    ("}", Motion::ParagraphForward),
    ("{", Motion::ParagraphBackward),
    ("'{char}", Motion::MarkLine),
    ("`{char}", Motion::MarkExact),
    ("<C-d>", Motion::HalfPageDown),
    ("<C-u>", Motion::HalfPageUp),
];

fn text_objects() -> Vec<(String, TextObject)> {
    let mut objects = Vec::new();
    for around in [false, true] {
        let prefix = if around { "a" } else { "i" };
        objects.push((format!("{prefix}w"), TextObject::Word { big: false, around }));
        objects.push((format!("{prefix}W"), TextObject::Word { big: true, around }));
        objects.push((format!("{prefix}p"), TextObject::Paragraph { around }));
        for quote in ['"', '\'', '`'] {
            objects.push((format!("{prefix}{quote}"), TextObject::Quote { quote, around }));
        }
        for (keys, open, close) in [
            (&["(", ")", "b"][..], '(', ')'),
            (&["[", "]"][..], '[', ']'),
            (&["{", "}", "B"][..], '{', '}'),
            (&["<lt>", ">"][..], '<', '>'),
        ] {
            for key in keys {
                objects.push((
                    format!("{prefix}{key}"),
                    TextObject::Bracket {
                        open,
                        close,
                        around,
                    },
                ));
            }
        }
    }
    objects
}

const OPERATORS: &[(&str, Operator)] = &[
    ("d", Operator::Delete),
    ("c", Operator::Change),
    ("y", Operator::Yank),
    (">", Operator::ShiftRight),
    ("<lt>", Operator::ShiftLeft),
    ("gu", Operator::Lowercase),
    ("gU", Operator::Uppercase),
    ("g~", Operator::ToggleCase),
];

const NORMAL: &[(&str, NormalCommand)] = &[
    ("x", NormalCommand::DeleteChar),
    ("<Del>", NormalCommand::DeleteChar),
    ("X", NormalCommand::DeleteCharBefore),
    ("D", NormalCommand::DeleteToEnd),
    ("C", NormalCommand::ChangeToEnd),
    ("Y", NormalCommand::YankLine),
    ("s", NormalCommand::Substitute),
    ("S", NormalCommand::SubstituteLine),
    ("r{char}", NormalCommand::ReplaceChar),
    ("J", NormalCommand::JoinLines),
    ("~", NormalCommand::ToggleCase),
    ("p", NormalCommand::PutAfter),
    ("P", NormalCommand::PutBefore),
    ("u", NormalCommand::Undo),
    ("<C-r>", NormalCommand::Redo),
    ("i", NormalCommand::Insert),
    ("<Insert>", NormalCommand::Insert),
    ("a", NormalCommand::Append),
    ("I", NormalCommand::InsertLineStart),
    ("A", NormalCommand::AppendLineEnd),
    ("o", NormalCommand::OpenBelow),
    ("O", NormalCommand::OpenAbove),
    ("v", NormalCommand::Visual(VisualKind::Char)),
    ("V", NormalCommand::Visual(VisualKind::Line)),
    ("<C-v>", NormalCommand::Visual(VisualKind::Block)),
    ("R", NormalCommand::ReplaceMode),
    (":", NormalCommand::CommandLine),
    (".", NormalCommand::RepeatLastChange),
    ("m{char}", NormalCommand::SetMark),
    ("<Esc>", NormalCommand::Escape),
];

const VISUAL: &[(&str, VisualCommand)] = &[
    ("<Esc>", VisualCommand::Exit),
    ("<C-c>", VisualCommand::Exit),
    ("v", VisualCommand::Switch(VisualKind::Char)),
    ("V", VisualCommand::Switch(VisualKind::Line)),
    ("<C-v>", VisualCommand::Switch(VisualKind::Block)),
    ("o", VisualCommand::SwapEnds),
    ("d", VisualCommand::Apply(Operator::Delete)),
    ("x", VisualCommand::Apply(Operator::Delete)),
    ("<Del>", VisualCommand::Apply(Operator::Delete)),
    ("c", VisualCommand::Apply(Operator::Change)),
    ("s", VisualCommand::Apply(Operator::Change)),
    ("y", VisualCommand::Apply(Operator::Yank)),
    (">", VisualCommand::Apply(Operator::ShiftRight)),
    ("<lt>", VisualCommand::Apply(Operator::ShiftLeft)),
    ("~", VisualCommand::Apply(Operator::ToggleCase)),
    ("u", VisualCommand::Apply(Operator::Lowercase)),
    ("U", VisualCommand::Apply(Operator::Uppercase)),
    ("J", VisualCommand::Join),
    ("p", VisualCommand::Put),
    ("P", VisualCommand::Put),
    (":", VisualCommand::CommandLine),
];

const INSERT: &[(&str, InsertCommand)] = &[
    ("<Esc>", InsertCommand::Exit),
    ("<C-c>", InsertCommand::Exit),
    ("<CR>", InsertCommand::Newline),
    ("<C-j>", InsertCommand::Newline),
    ("<BS>", InsertCommand::Backspace),
    ("<C-h>", InsertCommand::Backspace),
    ("<Del>", InsertCommand::Delete),
    ("<Tab>", InsertCommand::Tab),
    ("<C-w>", InsertCommand::DeleteWord),
    ("<C-u>", InsertCommand::DeleteLine),
    ("<C-r>{char}", InsertCommand::InsertRegister),
    ("<Left>", InsertCommand::Move(Motion::Left)),
    ("<Right>", InsertCommand::Move(Motion::Right)),
    ("<Up>", InsertCommand::Move(Motion::Up)),
    ("<Down>", InsertCommand::Move(Motion::Down)),
    ("<Home>", InsertCommand::Move(Motion::LineStart)),
    ("<End>", InsertCommand::Move(Motion::InsertLineEnd)),
    ("{char}", InsertCommand::Char),
];

const LINE_EDIT: &[(&str, LineEditCommand)] = &[
    ("<Esc>", LineEditCommand::Cancel),
    ("<C-c>", LineEditCommand::Cancel),
    ("<CR>", LineEditCommand::Submit),
    ("<C-j>", LineEditCommand::Submit),
    ("<BS>", LineEditCommand::Backspace),
    ("<C-h>", LineEditCommand::Backspace),
    ("<C-w>", LineEditCommand::DeleteWord),
    ("<C-u>", LineEditCommand::Clear),
    ("<C-r>{char}", LineEditCommand::InsertRegister),
    ("<Left>", LineEditCommand::Left),
    ("<Right>", LineEditCommand::Right),
    ("<Home>", LineEditCommand::Home),
    ("<C-b>", LineEditCommand::Home),
    ("<End>", LineEditCommand::End),
    ("<C-e>", LineEditCommand::End),
    ("{char}", LineEditCommand::Char),
];

/// Register every built-in action.
pub fn register_defaults(registry: &mut ActionRegistry) -> Result<(), RegistryError> {
    for &(keys, motion) in MOTIONS {
        registry.register(ActionSpec::new(keys, ModeSet::MOTION, Action::Motion(motion)))?;
    }
    for (keys, object) in text_objects() {
        registry.register(ActionSpec::new(
            &keys,
            ModeSet::SELECTION,
            Action::TextObject(object),
        ))?;
    }
    for &(keys, op) in OPERATORS {
        let spec = ActionSpec::new(keys, ModeSet::NORMAL, Action::Operator(op));
        registry.register(if op.modifies() { spec.repeatable() } else { spec })?;
    }
    for &(keys, cmd) in NORMAL {
        let spec = ActionSpec::new(keys, ModeSet::NORMAL, Action::Normal(cmd));
        registry.register(if cmd.modifies() { spec.repeatable() } else { spec })?;
    }
    for &(keys, cmd) in VISUAL {
        registry.register(ActionSpec::new(keys, ModeSet::VISUAL, Action::Visual(cmd)))?;
    }
    for &(keys, cmd) in INSERT {
        registry.register(ActionSpec::new(
            keys,
            ModeSet::INSERT | ModeSet::REPLACE,
            Action::Insert(cmd),
        ))?;
    }
    for &(keys, cmd) in LINE_EDIT {
        registry.register(ActionSpec::new(
            keys,
            ModeSet::COMMAND_LINE,
            Action::LineEdit(cmd),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Lookup;
    use crate::keys::parse_keys;
    use crate::mode::Mode;

    fn action(registry: &ActionRegistry, mode: Mode, keys: &str) -> Option<Action> {
        match registry.lookup(mode, &parse_keys(keys)) {
            Lookup::Exact { spec, .. } => Some(spec.action),
            _ => None,
        }
    }

    #[test]
    fn test_same_key_means_different_things_per_mode() {
        let registry = ActionRegistry::with_defaults().unwrap();
        assert_eq!(
            action(&registry, Mode::Normal, "u"),
            Some(Action::Normal(NormalCommand::Undo))
        );
        assert_eq!(
            action(&registry, Mode::Visual(VisualKind::Char), "u"),
            Some(Action::Visual(VisualCommand::Apply(Operator::Lowercase)))
        );
        assert_eq!(
            action(&registry, Mode::Insert, "u"),
            Some(Action::Insert(InsertCommand::Char))
        );
        assert_eq!(
            action(&registry, Mode::Replace, "<BS>"),
            Some(Action::Insert(InsertCommand::Backspace))
        );
        assert_eq!(
            action(&registry, Mode::CommandLine, "<BS>"),
            Some(Action::LineEdit(LineEditCommand::Backspace))
        );
    }

    #[test]
    fn test_text_objects_only_after_operator_or_in_visual() {
        let registry = ActionRegistry::with_defaults().unwrap();
        let inner_paren = Some(Action::TextObject(TextObject::Bracket {
            open: '(',
            close: ')',
            around: false,
        }));
        assert_eq!(action(&registry, Mode::OperatorPending, "ib"), inner_paren);
        assert_eq!(
            action(&registry, Mode::Visual(VisualKind::Char), "i("),
            inner_paren
        );
        assert_eq!(action(&registry, Mode::Normal, "ib"), None);
    }

    #[test]
    fn test_shift_left_uses_lt_notation() {
        let registry = ActionRegistry::with_defaults().unwrap();
        assert_eq!(
            action(&registry, Mode::Normal, "<lt>"),
            Some(Action::Operator(Operator::ShiftLeft))
        );
        assert_eq!(
            action(&registry, Mode::OperatorPending, "a<lt>"),
            Some(Action::TextObject(TextObject::Bracket {
                open: '<',
                close: '>',
                around: true,
            }))
        );
    }

    #[test]
    fn test_yank_is_not_repeatable() {
        let registry = ActionRegistry::with_defaults().unwrap();
        let repeatable = |keys: &str| match registry.lookup(Mode::Normal, &parse_keys(keys)) {
            Lookup::Exact { spec, .. } => spec.repeatable,
            _ => panic!("{keys} not found"),
        };
        assert!(repeatable("d"));
        assert!(repeatable("x"));
        assert!(!repeatable("y"));
        assert!(!repeatable("u"));
    }
}
