//! Linewise register commands: `:delete`, `:yank` and `:put`.

use crate::actions::operator::{put_lines, Operator, OperatorRange};
use crate::error::{ActionError, ExError};
use crate::ex::range::LineRange;
use crate::ex::table::ExArgs;
use crate::registers;
use crate::session::SessionState;

use super::ExCommand;

/// `:[range]d [x] [count]` and `:[range]y [x] [count]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCommand {
    pub range: Option<LineRange>,
    pub register: Option<char>,
    /// Lines counted from the last line of the range.
    pub count: Option<usize>,
}

/// `:[line]pu[!] [x]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCommand {
    pub range: Option<LineRange>,
    pub register: Option<char>,
    pub above: bool,
}

pub fn build_delete(args: ExArgs) -> Result<ExCommand, ExError> {
    LineCommand::from_args(args).map(ExCommand::Delete)
}

pub fn build_yank(args: ExArgs) -> Result<ExCommand, ExError> {
    LineCommand::from_args(args).map(ExCommand::Yank)
}

pub fn build_put(args: ExArgs) -> Result<ExCommand, ExError> {
    let (register, rest) = take_register(args.argument.trim())?;
    if !rest.is_empty() {
        return Err(ExError::InvalidArguments(format!("trailing characters: {rest}")));
    }
    Ok(ExCommand::Put(PutCommand {
        range: args.range,
        register,
        above: args.bang,
    }))
}

/// Split an optional register name off the front of the argument. Digits
/// start a count, so numbered registers cannot be named here.
fn take_register(argument: &str) -> Result<(Option<char>, &str), ExError> {
    match argument.chars().next() {
        Some(c) if !c.is_ascii_digit() => {
            if !registers::is_valid_name(c) {
                return Err(ActionError::InvalidRegister(c).into());
            }
            Ok((Some(c), argument[c.len_utf8()..].trim_start()))
        }
        _ => Ok((None, argument)),
    }
}

impl LineCommand {
    fn from_args(args: ExArgs) -> Result<Self, ExError> {
        let (register, rest) = take_register(args.argument.trim())?;
        let count = if rest.is_empty() {
            None
        } else {
            let count = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ExError::InvalidArguments(format!("invalid count: {rest}")))?;
            Some(count)
        };
        Ok(Self {
            range: args.range,
            register,
            count,
        })
    }

    /// 0-based `(first, last)`, clamped to the buffer.
    fn lines(&self, session: &SessionState) -> Result<(usize, usize), ExError> {
        let buf = session.buffer.as_ref();
        let (start, end) = match &self.range {
            Some(range) => range.resolve(buf, &session.marks)?,
            None => {
                let line = buf.cursor().line + 1;
                (line, line)
            }
        };
        let (start, end) = match self.count {
            Some(count) => (end.max(1), end.max(1).saturating_add(count - 1)),
            None => (start.max(1), end.max(1)),
        };
        let last = buf.last_line();
        Ok(((start - 1).min(last), (end - 1).min(last)))
    }

    pub fn delete(self, session: &mut SessionState) -> Result<(), ExError> {
        let (first, last) = self.lines(session)?;
        Operator::Delete.apply(session, OperatorRange::Lines { first, last }, self.register)?;
        Ok(())
    }

    /// Yank without moving the cursor.
    pub fn yank(self, session: &mut SessionState) -> Result<(), ExError> {
        let (first, last) = self.lines(session)?;
        let cursor = session.buffer.cursor();
        Operator::Yank.apply(session, OperatorRange::Lines { first, last }, self.register)?;
        session.buffer.set_cursor(cursor);
        Ok(())
    }
}

impl PutCommand {
    pub fn execute(self, session: &mut SessionState) -> Result<(), ExError> {
        let line = match &self.range {
            Some(range) => range.resolve(session.buffer.as_ref(), &session.marks)?.1,
            None => session.buffer.cursor().line + 1,
        };
        let register = session
            .registers
            .get(self.register)
            .filter(|r| !r.content.is_empty())
            .ok_or(ActionError::EmptyRegister(self.register.unwrap_or(registers::UNNAMED)))?;
        // Always linewise, whatever the register holds.
        let mut content = register.content.clone();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        let buf = session.buffer.as_mut();
        match line {
            0 => put_lines(buf, 0, &content, true),
            line => put_lines(buf, line - 1, &content, self.above),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{MemoryBuffer, Position};
    use crate::ex::range::{Address, LineSpecifier, Separator};
    use crate::registers::Register;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> SessionState {
        SessionState::new(Box::new(MemoryBuffer::from_text(text)))
    }

    fn lines(s: &SessionState) -> Vec<String> {
        s.buffer.text().split('\n').map(String::from).collect()
    }

    fn args(range: Option<LineRange>, bang: bool, argument: &str) -> ExArgs {
        ExArgs {
            range,
            bang,
            argument: argument.into(),
        }
    }

    fn span(a: usize, b: usize) -> LineRange {
        LineRange {
            start: Address::new(LineSpecifier::Number(a)),
            rest: vec![(Separator::Comma, Address::new(LineSpecifier::Number(b)))],
        }
    }

    fn line_command(argument: &str, range: Option<LineRange>) -> LineCommand {
        match build_delete(args(range, false, argument)).unwrap() {
            ExCommand::Delete(cmd) => cmd,
            other => panic!("expected delete, got {other:?}"),
        }
    }

    #[test]
    fn test_register_and_count_arguments() {
        let cmd = line_command("a 3", None);
        assert_eq!((cmd.register, cmd.count), (Some('a'), Some(3)));
        let cmd = line_command("2", None);
        assert_eq!((cmd.register, cmd.count), (None, Some(2)));
        let cmd = line_command("", None);
        assert_eq!((cmd.register, cmd.count), (None, None));
        assert!(build_delete(args(None, false, "a b")).is_err());
        assert!(build_delete(args(None, false, "0")).is_err());
    }

    #[test]
    fn test_delete_range_into_register() {
        let mut s = session("1\n2\n3\n4");
        line_command("a", Some(span(2, 3))).delete(&mut s).unwrap();
        assert_eq!(lines(&s), vec!["1", "4"]);
        assert_eq!(s.registers.get(Some('a')).unwrap().content, "2\n3\n");
    }

    #[test]
    fn test_count_starts_at_range_end() {
        let mut s = session("1\n2\n3\n4");
        let range = LineRange::single(Address::new(LineSpecifier::Number(2)));
        line_command("2", Some(range)).delete(&mut s).unwrap();
        assert_eq!(lines(&s), vec!["1", "4"]);
    }

    #[test]
    fn test_huge_count_stops_at_last_line() {
        let mut s = session("a\nb\nc");
        s.buffer.set_cursor(Position::new(1, 0));
        line_command("18446744073709551615", None).delete(&mut s).unwrap();
        assert_eq!(lines(&s), vec!["a"]);
    }

    #[test]
    fn test_yank_keeps_cursor() {
        let mut s = session("1\n2\n3");
        s.buffer.set_cursor(Position::new(2, 0));
        let cmd = match build_yank(args(Some(span(1, 2)), false, "")).unwrap() {
            ExCommand::Yank(cmd) => cmd,
            other => panic!("expected yank, got {other:?}"),
        };
        cmd.yank(&mut s).unwrap();
        assert_eq!(s.registers.get(None).unwrap().content, "1\n2\n");
        assert_eq!(s.buffer.cursor(), Position::new(2, 0));
        assert_eq!(lines(&s), vec!["1", "2", "3"]);
    }

    fn put(range: Option<LineRange>, bang: bool, argument: &str) -> PutCommand {
        match build_put(args(range, bang, argument)).unwrap() {
            ExCommand::Put(cmd) => cmd,
            other => panic!("expected put, got {other:?}"),
        }
    }

    #[test]
    fn test_put_makes_text_linewise() {
        let mut s = session("a\nb");
        s.registers.store_yank(Some('x'), Register::charwise("word"));
        put(None, false, "x").execute(&mut s).unwrap();
        assert_eq!(lines(&s), vec!["a", "word", "b"]);

        put(Some(LineRange::single(Address::new(LineSpecifier::Number(0)))), false, "x")
            .execute(&mut s)
            .unwrap();
        assert_eq!(lines(&s), vec!["word", "a", "word", "b"]);

        put(Some(LineRange::single(Address::new(LineSpecifier::Last))), true, "x")
            .execute(&mut s)
            .unwrap();
        assert_eq!(lines(&s), vec!["word", "a", "word", "word", "b"]);
    }

    #[test]
    fn test_put_empty_register_fails() {
        let mut s = session("a");
        let err = put(None, false, "q").execute(&mut s).unwrap_err();
        assert!(
            matches!(err, ExError::Action(ActionError::EmptyRegister('q'))),
            "{err:?}"
        );
        assert_eq!(lines(&s), vec!["a"]);
    }
}
