//! Turning keys into actions.
//!
//! [`dispatch`] takes one already-remapped key. Counts and register prefixes
//! are peeled off first; the remaining keys are matched against the action
//! registry. A matched operator waits in Operator-pending mode for the motion
//! or text object that supplies its range.

use tracing::{debug, trace};

use crate::actions::command::{ActionArgs, Effect};
use crate::actions::motion::{self, Target};
use crate::actions::{
    Action, ActionRegistry, ActionSpec, Lookup, Motion, MotionType, Operator, OperatorRange,
    TextObject,
};
use crate::buffer::{Position, TextBuffer};
use crate::error::ActionError;
use crate::keys::Key;
use crate::mode::Mode;
use crate::recorded::PendingOperator;
use crate::registers::{self, Marks};
use crate::session::SessionState;

/// What happened to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Consumed; more keys are needed.
    Pending,
    Executed,
    /// The keys match nothing; they were dropped.
    NoMatch,
    /// `<Esc>` abandoned a half-typed sequence.
    Cancelled,
    /// An action ran and failed; the error is in the session message.
    Failed,
    /// The command line was submitted with this text.
    Submit(String),
}

pub fn dispatch(registry: &ActionRegistry, session: &mut SessionState, key: Key) -> DispatchOutcome {
    let mode = session.mode();
    if mode.is_typing() && !session.replaying {
        if let Some(recording) = session.change_recording.as_mut() {
            recording.push(key.clone());
        }
    }
    session.recorded.typed.push(key.clone());

    let peels = matches!(
        mode,
        Mode::Normal | Mode::Visual(_) | Mode::OperatorPending
    );
    if peels {
        if let Some(outcome) = peel(session, &key) {
            return outcome;
        }
    }
    session.recorded.pending.push(key);

    if mode == Mode::OperatorPending {
        if let Some(outcome) = doubled_operator(session) {
            return outcome;
        }
    }

    let pending = session.recorded.pending.clone();
    match registry.lookup(mode, &pending) {
        Lookup::Exact { spec, chars } => {
            session.recorded.awaiting_char = false;
            execute(registry, session, spec, chars.first().copied())
        }
        Lookup::Prefix { wants_char } => {
            session.recorded.awaiting_char = wants_char;
            DispatchOutcome::Pending
        }
        Lookup::None if mode == Mode::OperatorPending && doubles_prefix(session) => {
            DispatchOutcome::Pending
        }
        Lookup::None => {
            trace!(keys = %session.recorded.display(), "no action matches");
            abort(session);
            DispatchOutcome::NoMatch
        }
    }
}

/// Handle `<Esc>`, counts and `"x` register prefixes. Returns `None` when
/// the key belongs to the action itself.
fn peel(session: &mut SessionState, key: &Key) -> Option<DispatchOutcome> {
    let rec = &mut session.recorded;
    if *key == Key::esc() && (rec.typed.len() > 1 || rec.operator.is_some()) {
        abort(session);
        return Some(DispatchOutcome::Cancelled);
    }
    if rec.awaiting_register {
        return match key.as_char().filter(|&c| registers::is_valid_name(c)) {
            Some(name) => {
                rec.register = Some(name);
                rec.awaiting_register = false;
                Some(DispatchOutcome::Pending)
            }
            None => {
                abort(session);
                Some(DispatchOutcome::NoMatch)
            }
        };
    }
    if !rec.pending.is_empty() {
        return None;
    }
    if let Some(digit) = key.digit() {
        if digit != 0 || rec.count.is_some() {
            rec.push_digit(digit);
            return Some(DispatchOutcome::Pending);
        }
    }
    if key.as_char() == Some('"') && rec.operator.is_none() {
        rec.awaiting_register = true;
        return Some(DispatchOutcome::Pending);
    }
    None
}

/// Forget the half-typed sequence, leaving Operator-pending mode.
fn abort(session: &mut SessionState) {
    if session.mode() == Mode::OperatorPending {
        session.return_to_normal();
    }
    session.recorded.clear();
}

/// Key sequences that double the pending operator: `dd`, `gUgU` and `gUU`.
fn doubled_forms(op: &PendingOperator) -> Vec<Vec<Key>> {
    let mut forms = vec![op.trigger.clone()];
    if op.trigger.len() > 1 {
        forms.extend(op.trigger.last().cloned().map(|k| vec![k]));
    }
    forms
}

fn doubles_prefix(session: &SessionState) -> bool {
    let rec = &session.recorded;
    rec.operator.as_ref().is_some_and(|op| {
        doubled_forms(op)
            .iter()
            .any(|form| form.len() > rec.pending.len() && form.starts_with(&rec.pending))
    })
}

fn doubled_operator(session: &mut SessionState) -> Option<DispatchOutcome> {
    let rec = &session.recorded;
    let op = rec.operator.as_ref()?;
    if !doubled_forms(op).contains(&rec.pending) {
        return None;
    }
    let operator = op.operator;
    let count = rec.effective_count().unwrap_or(1).max(1);
    let register = rec.effective_register();
    let first = session.buffer.cursor().line;
    let last = (first + count - 1).min(session.buffer.last_line());
    debug!(?operator, first, last, "linewise operator");

    session.begin_change();
    let result = operator
        .apply(session, OperatorRange::Lines { first, last }, register)
        .and_then(|mode| Ok(session.set_mode(mode)?));
    Some(finish(session, result.map(|_| Effect::None), operator.modifies()))
}

fn execute(
    registry: &ActionRegistry,
    session: &mut SessionState,
    spec: &ActionSpec,
    ch: Option<char>,
) -> DispatchOutcome {
    let mode = session.mode();
    let rec = &mut session.recorded;
    let args = ActionArgs {
        count: rec.effective_count(),
        register: rec.effective_register(),
        ch,
    };

    if let (Action::Operator(operator), Mode::Normal) = (spec.action, mode) {
        rec.operator = Some(PendingOperator {
            operator,
            count: rec.count.take(),
            register: rec.register.take(),
            trigger: std::mem::take(&mut rec.pending),
        });
        return match session.set_mode(Mode::OperatorPending) {
            Ok(_) => DispatchOutcome::Pending,
            Err(err) => {
                session.error(err.to_string());
                abort(session);
                DispatchOutcome::Failed
            }
        };
    }

    let operator = rec.operator.as_ref().map(|op| op.operator);
    let modifies = spec.action.may_modify() || operator.is_some_and(Operator::modifies);
    if modifies {
        session.begin_change();
    }
    trace!(action = ?spec.action, ?args, "execute");

    let result = match spec.action {
        Action::Motion(m) => run_motion(session, m, operator, args).map(|_| Effect::None),
        Action::TextObject(obj) => {
            run_text_object(session, obj, operator).map(|_| Effect::None)
        }
        Action::Operator(_) => Err(ActionError::MotionFailed),
        Action::Normal(cmd) => cmd.execute(session, args),
        Action::Visual(cmd) => cmd.execute(session, args),
        Action::Insert(cmd) => cmd.execute(session, args),
        Action::LineEdit(cmd) => cmd.execute(session, args),
    };

    let result = match result {
        Ok(Effect::Replay(keys)) => {
            session.recorded.clear();
            return replay(registry, session, keys);
        }
        other => other,
    };
    let completes_change =
        spec.repeatable || operator.is_some_and(|op| op.modifies() && op != Operator::Yank);
    finish(session, result, completes_change)
}

/// Common tail of every executed action: report errors, settle history,
/// remember the change for `.`, and reset the recorded keys.
fn finish(
    session: &mut SessionState,
    result: Result<Effect, ActionError>,
    completes_change: bool,
) -> DispatchOutcome {
    let outcome = match result {
        Ok(Effect::Submit(text)) => DispatchOutcome::Submit(text),
        Ok(_) => DispatchOutcome::Executed,
        Err(err) => {
            debug!(%err, "action failed");
            session.error(err.to_string());
            if session.mode() == Mode::OperatorPending {
                session.return_to_normal();
            }
            DispatchOutcome::Failed
        }
    };

    let mode = session.mode();
    if !session.replaying {
        if completes_change && outcome == DispatchOutcome::Executed {
            let keys = session.recorded.typed.clone();
            if mode.is_typing() {
                session.change_recording = Some(keys);
            } else {
                session.last_change = keys;
            }
        } else if !mode.is_typing() {
            if let Some(keys) = session.change_recording.take() {
                session.last_change = keys;
            }
        }
    }
    if !mode.is_typing() && session.history.in_change() {
        session.commit_change();
    }
    if !mode.is_typing() && mode != Mode::CommandLine {
        clamp_cursor(session.buffer.as_mut());
    }
    session.recorded.clear();
    outcome
}

/// `.`: feed the keys of the last change through again as one undo step.
fn replay(registry: &ActionRegistry, session: &mut SessionState, keys: Vec<Key>) -> DispatchOutcome {
    if keys.is_empty() {
        return DispatchOutcome::Executed;
    }
    debug!(keys = keys.len(), "repeating last change");
    session.begin_change();
    session.replaying = true;
    let mut outcome = DispatchOutcome::Executed;
    for key in keys {
        if dispatch(registry, session, key) == DispatchOutcome::Failed {
            outcome = DispatchOutcome::Failed;
            break;
        }
    }
    session.replaying = false;
    if session.mode().is_typing() {
        session.return_to_normal();
    }
    session.recorded.clear();
    session.commit_change();
    outcome
}

fn run_motion(
    session: &mut SessionState,
    motion: Motion,
    operator: Option<Operator>,
    args: ActionArgs,
) -> Result<(), ActionError> {
    let cursor = session.buffer.cursor();
    let target = match (operator, motion) {
        (Some(Operator::Change), Motion::WordForward { big })
            if !crate::actions::text::char_at(session.buffer.as_ref(), cursor)
                .is_some_and(char::is_whitespace) =>
        {
            motion::change_word_target(session.buffer.as_ref(), cursor, big, args.count_or_one())
        }
        _ => motion
            .evaluate(session, args.count, args.ch)
            .ok_or(ActionError::MotionFailed)?,
    };
    if let (Motion::Find(kind), Some(ch)) = (motion, args.ch) {
        session.last_find = Some((kind, ch));
    }

    let Some(operator) = operator else {
        if motion.is_jump() {
            session.marks.set(Marks::PREVIOUS, cursor);
        }
        if motion.is_vertical() {
            session.desired_column.get_or_insert(cursor.column);
        } else if motion == Motion::LineEnd {
            session.desired_column = Some(usize::MAX);
        } else {
            session.desired_column = None;
        }
        session.buffer.set_cursor(target.position);
        return Ok(());
    };

    let target = match motion {
        Motion::WordForward { .. } if operator != Operator::Change => {
            stop_at_line_end(session.buffer.as_ref(), cursor, target)
        }
        _ => target,
    };
    let range = OperatorRange::from_motion(
        session.buffer.as_ref(),
        cursor,
        target.position,
        target.kind,
    );
    apply_pending(session, operator, range)
}

/// `dw` on the last word of a line stops at the end of that line rather
/// than eating the line break.
fn stop_at_line_end(buf: &dyn TextBuffer, cursor: Position, target: Target) -> Target {
    if target.position.line <= cursor.line || target.kind != MotionType::Exclusive {
        return target;
    }
    let mut line = target.position.line - 1;
    while line > cursor.line && buf.line_len(line) == 0 {
        line -= 1;
    }
    Target {
        position: Position::new(line, buf.line_len(line)),
        kind: MotionType::Exclusive,
    }
}

fn run_text_object(
    session: &mut SessionState,
    object: TextObject,
    operator: Option<Operator>,
) -> Result<(), ActionError> {
    let cursor = session.buffer.cursor();
    let span = object
        .select(session.buffer.as_ref(), cursor)
        .ok_or(ActionError::MotionFailed)?;
    match operator {
        Some(operator) => {
            let range = OperatorRange::from_span(session.buffer.as_ref(), span);
            apply_pending(session, operator, range)
        }
        None => {
            session.visual_anchor = span.start;
            session.buffer.set_cursor(span.end);
            Ok(())
        }
    }
}

fn apply_pending(
    session: &mut SessionState,
    operator: Operator,
    range: OperatorRange,
) -> Result<(), ActionError> {
    let register = session.recorded.effective_register();
    let mode = operator.apply(session, range, register)?;
    session.set_mode(mode)?;
    Ok(())
}

/// Outside Insert mode the cursor sits on a character, not after the last.
pub(crate) fn clamp_cursor(buf: &mut dyn TextBuffer) {
    let cursor = buf.cursor();
    let len = buf.line_len(cursor.line);
    if len > 0 && cursor.column >= len {
        buf.set_cursor(Position::new(cursor.line, len - 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::keys::parse_keys;
    use crate::mode::VisualKind;
    use pretty_assertions::assert_eq;

    struct Harness {
        registry: ActionRegistry,
        session: SessionState,
    }

    impl Harness {
        fn new(text: &str) -> Self {
            Self {
                registry: ActionRegistry::with_defaults().unwrap(),
                session: SessionState::new(Box::new(MemoryBuffer::from_text(text))),
            }
        }

        fn at(mut self, line: usize, column: usize) -> Self {
            self.session.buffer.set_cursor(Position::new(line, column));
            self
        }

        fn keys(&mut self, notation: &str) -> DispatchOutcome {
            let mut last = DispatchOutcome::Pending;
            for key in parse_keys(notation) {
                last = dispatch(&self.registry, &mut self.session, key);
            }
            last
        }

        fn text(&self) -> String {
            self.session.buffer.text()
        }

        fn cursor(&self) -> Position {
            self.session.buffer.cursor()
        }
    }

    #[test]
    fn test_delete_word() {
        let mut h = Harness::new("hello world");
        assert_eq!(h.keys("d"), DispatchOutcome::Pending);
        assert_eq!(h.session.mode(), Mode::OperatorPending);
        assert_eq!(h.keys("w"), DispatchOutcome::Executed);
        assert_eq!(h.text(), "world");
        assert_eq!(h.session.mode(), Mode::Normal);
    }

    #[test]
    fn test_operator_then_non_motion_aborts() {
        let mut h = Harness::new("hello world");
        h.keys("d");
        assert_eq!(h.keys("z"), DispatchOutcome::NoMatch);
        assert_eq!(h.session.mode(), Mode::Normal);
        assert_eq!(h.text(), "hello world");
        assert!(h.session.recorded.is_empty());
    }

    #[test]
    fn test_escape_cancels_pending_operator() {
        let mut h = Harness::new("abc");
        h.keys("2d");
        assert_eq!(h.keys("<Esc>"), DispatchOutcome::Cancelled);
        assert_eq!(h.session.mode(), Mode::Normal);
        assert_eq!(h.text(), "abc");
    }

    #[test]
    fn test_dw_at_last_word_keeps_line_break() {
        let mut h = Harness::new("foo bar\nbaz").at(0, 4);
        h.keys("dw");
        assert_eq!(h.text(), "foo \nbaz");
        assert_eq!(h.cursor(), Position::new(0, 3));
    }

    #[test]
    fn test_counts_multiply() {
        let mut h = Harness::new("a b c d e f g h");
        h.keys("2d3w");
        assert_eq!(h.text(), "g h");
    }

    #[test]
    fn test_doubled_operator_is_linewise() {
        let mut h = Harness::new("one\ntwo\nthree\nfour").at(1, 1);
        h.keys("2dd");
        assert_eq!(h.text(), "one\nfour");
        let reg = h.session.registers.get(None).unwrap();
        assert_eq!(reg.content, "two\nthree\n");
    }

    #[test]
    fn test_g_prefixed_doubled_forms() {
        let mut h = Harness::new("abc\ndef");
        h.keys("gUU");
        assert_eq!(h.text(), "ABC\ndef");
        h.keys("j");
        h.keys("gUgU");
        assert_eq!(h.text(), "ABC\nDEF");
        h.keys("guu");
        assert_eq!(h.text(), "ABC\ndef");
    }

    #[test]
    fn test_register_prefix() {
        let mut h = Harness::new("alpha beta");
        h.keys("\"ayw");
        assert_eq!(h.session.registers.get(Some('a')).unwrap().content, "alpha ");
        h.keys("w\"ap");
        assert_eq!(h.text(), "alpha balpha eta");
    }

    #[test]
    fn test_find_records_last_find() {
        let mut h = Harness::new("a-b-c-d");
        h.keys("f-");
        assert_eq!(h.cursor(), Position::new(0, 1));
        h.keys(";");
        assert_eq!(h.cursor(), Position::new(0, 3));
        h.keys("dt-");
        assert_eq!(h.text(), "a-b-d");
    }

    #[test]
    fn test_char_argument_takes_digits_literally() {
        let mut h = Harness::new("abc");
        h.keys("r5");
        assert_eq!(h.text(), "5bc");
    }

    #[test]
    fn test_change_word_and_repeat() {
        let mut h = Harness::new("foo bar baz");
        h.keys("cwqux<Esc>");
        assert_eq!(h.text(), "qux bar baz");
        assert_eq!(h.session.mode(), Mode::Normal);
        h.keys("w.");
        assert_eq!(h.text(), "qux qux baz");
        h.keys("u");
        assert_eq!(h.text(), "qux bar baz");
    }

    #[test]
    fn test_insert_is_one_undo_step() {
        let mut h = Harness::new("");
        h.keys("ihello<CR>world<Esc>");
        assert_eq!(h.text(), "hello\nworld");
        assert_eq!(h.cursor(), Position::new(1, 4));
        h.keys("u");
        assert_eq!(h.text(), "");
    }

    #[test]
    fn test_dot_repeats_x_with_its_count() {
        let mut h = Harness::new("abcdefg");
        h.keys("2x");
        h.keys(".");
        assert_eq!(h.text(), "efg");
    }

    #[test]
    fn test_vertical_motion_keeps_column() {
        let mut h = Harness::new("long line\nab\nanother").at(0, 6);
        h.keys("j");
        assert_eq!(h.cursor(), Position::new(1, 1));
        h.keys("j");
        assert_eq!(h.cursor(), Position::new(2, 6));
        h.keys("$k");
        assert_eq!(h.cursor(), Position::new(1, 1));
    }

    #[test]
    fn test_jump_sets_previous_mark() {
        let mut h = Harness::new("a\nb\nc").at(1, 0);
        h.keys("G");
        assert_eq!(h.session.marks.get('\''), Some(Position::new(1, 0)));
        h.keys("''");
        assert_eq!(h.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_visual_text_object_and_delete() {
        let mut h = Harness::new("call(a, b)").at(0, 6);
        h.keys("vi(");
        assert_eq!(h.session.mode(), Mode::Visual(VisualKind::Char));
        h.keys("d");
        assert_eq!(h.text(), "call()");
    }

    #[test]
    fn test_operator_with_text_object() {
        let mut h = Harness::new("say \"hi there\" now").at(0, 7);
        h.keys("ci\"yo<Esc>");
        assert_eq!(h.text(), "say \"yo\" now");
    }

    #[test]
    fn test_colon_with_count_prefills_range() {
        let mut h = Harness::new("a\nb\nc");
        h.keys("3:");
        assert_eq!(h.session.mode(), Mode::CommandLine);
        assert_eq!(h.session.command_line.text, ".,.+2");
        assert_eq!(h.keys("<CR>"), DispatchOutcome::Submit(".,.+2".into()));
    }

    #[test]
    fn test_failed_action_reports_error() {
        let mut h = Harness::new("abc");
        assert_eq!(h.keys("\"qp"), DispatchOutcome::Failed);
        assert_eq!(
            h.session.message.as_ref().map(|m| m.text.as_str()),
            Some("nothing in register q")
        );
    }

    #[test]
    fn test_replace_mode() {
        let mut h = Harness::new("abcd").at(0, 1);
        h.keys("RXY<BS><Esc>");
        assert_eq!(h.text(), "aXcd");
        assert_eq!(h.session.mode(), Mode::Normal);
    }
}
