//! `:registers` and `:marks`.

use crate::error::ExError;
use crate::ex::table::ExArgs;
use crate::registers::RegisterKind;
use crate::session::SessionState;

use super::ExCommand;

pub fn build_registers(args: ExArgs) -> Result<ExCommand, ExError> {
    let filter: String = args.argument.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(ExCommand::Registers((!filter.is_empty()).then_some(filter)))
}

pub fn build_marks(_: ExArgs) -> Result<ExCommand, ExError> {
    Ok(ExCommand::Marks)
}

/// Newlines and other control characters shown in caret notation.
fn printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("^J"),
            '\t' => out.push_str("^I"),
            c if c.is_control() && (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(b'@' + c as u8));
            }
            c => out.push(c),
        }
    }
    out
}

pub fn show_registers(session: &mut SessionState, filter: Option<&str>) {
    let mut lines = vec!["Type Name Content".to_string()];
    for (name, register) in session.registers.list() {
        if filter.is_some_and(|f| !f.contains(name)) {
            continue;
        }
        let kind = match register.kind {
            RegisterKind::Charwise => 'c',
            RegisterKind::Linewise => 'l',
            RegisterKind::Blockwise => 'b',
        };
        lines.push(format!("  {kind}  \"{name}   {}", printable(&register.content)));
    }
    session.info(lines.join("\n"));
}

pub fn show_marks(session: &mut SessionState) {
    let buf = session.buffer.as_ref();
    let mut lines = vec!["mark line  col text".to_string()];
    for (name, pos) in session.marks.iter() {
        let text = buf.line(pos.line).unwrap_or_default().trim();
        lines.push(format!(" {name} {:>6} {:>4} {text}", pos.line + 1, pos.column));
    }
    session.info(lines.join("\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{MemoryBuffer, Position};
    use crate::registers::Register;
    use pretty_assertions::assert_eq;

    fn session() -> SessionState {
        SessionState::new(Box::new(MemoryBuffer::from_text("first\n  second")))
    }

    fn shown(s: &SessionState) -> Vec<String> {
        s.message
            .as_ref()
            .map(|m| m.text.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_registers_listing() {
        let mut s = session();
        s.registers.store_yank(Some('a'), Register::linewise("one\ttwo"));
        s.registers.store_yank(None, Register::charwise("w"));
        show_registers(&mut s, None);
        assert_eq!(
            shown(&s),
            vec![
                "Type Name Content",
                "  c  \"\"   w",
                "  c  \"0   w",
                "  l  \"a   one^Itwo^J",
            ]
        );

        show_registers(&mut s, Some("a"));
        assert_eq!(shown(&s), vec!["Type Name Content", "  l  \"a   one^Itwo^J"]);
    }

    #[test]
    fn test_registers_filter_strips_spaces() {
        match build_registers(ExArgs {
            argument: "a b".into(),
            ..Default::default()
        })
        .unwrap()
        {
            ExCommand::Registers(filter) => assert_eq!(filter.as_deref(), Some("ab")),
            other => panic!("expected registers, got {other:?}"),
        }
    }

    #[test]
    fn test_marks_listing() {
        let mut s = session();
        s.marks.set('a', Position::new(1, 3));
        s.buffer.set_cursor(Position::new(0, 0));
        show_marks(&mut s);
        assert_eq!(
            shown(&s),
            vec!["mark line  col text", " a      2    3 second"]
        );
    }
}
