//! The `:map` family.

use crate::error::ExError;
use crate::ex::table::ExArgs;
use crate::keys::{parse_keys, render_keys};
use crate::mode::ModeSet;
use crate::remap::{mode_tag, Mapping};
use crate::session::SessionState;

use super::ExCommand;

/// `:map {lhs} {rhs}` adds a mapping; with only `{lhs}`, or nothing, it
/// lists the matching mappings instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapCommand {
    pub modes: ModeSet,
    pub noremap: bool,
    pub lhs: Option<String>,
    pub rhs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmapCommand {
    pub modes: ModeSet,
    pub lhs: String,
}

pub fn build_map(args: ExArgs, modes: ModeSet, noremap: bool) -> Result<ExCommand, ExError> {
    let argument = args.argument.trim();
    let (lhs, rhs) = match argument.split_once(char::is_whitespace) {
        Some((lhs, rhs)) => (Some(lhs), Some(rhs.trim_start())),
        None if argument.is_empty() => (None, None),
        None => (Some(argument), None),
    };
    Ok(ExCommand::Map(MapCommand {
        modes,
        noremap,
        lhs: lhs.map(String::from),
        rhs: rhs.map(String::from),
    }))
}

pub fn build_unmap(args: ExArgs, modes: ModeSet) -> Result<ExCommand, ExError> {
    let lhs = args.argument.trim();
    if lhs.is_empty() {
        return Err(ExError::InvalidArguments("unmap needs a key sequence".into()));
    }
    Ok(ExCommand::Unmap(UnmapCommand {
        modes,
        lhs: lhs.to_string(),
    }))
}

impl MapCommand {
    pub fn execute(self, session: &mut SessionState) -> Result<(), ExError> {
        match (self.lhs, self.rhs) {
            (Some(lhs), Some(rhs)) => {
                let mapping = Mapping::new(parse_keys(&lhs), parse_keys(&rhs), self.noremap);
                session.remaps.insert(self.modes, mapping)?;
            }
            (lhs, _) => list(session, self.modes, lhs.as_deref()),
        }
        Ok(())
    }
}

impl UnmapCommand {
    pub fn execute(self, session: &mut SessionState) -> Result<(), ExError> {
        session.remaps.remove(self.modes, &parse_keys(&self.lhs))?;
        Ok(())
    }
}

fn list(session: &mut SessionState, modes: ModeSet, prefix: Option<&str>) {
    let prefix = prefix.map(parse_keys).unwrap_or_default();
    let lines: Vec<String> = session
        .remaps
        .mappings(modes)
        .into_iter()
        .filter(|(_, m)| m.lhs.starts_with(&prefix))
        .map(|(mode, m)| {
            format!(
                "{:<3}{:<12}{}{}",
                mode_tag(mode),
                render_keys(&m.lhs),
                if m.noremap { '*' } else { ' ' },
                render_keys(&m.rhs)
            )
        })
        .collect();
    if lines.is_empty() {
        session.info("No mapping found");
    } else {
        session.info(lines.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::error::RemapError;
    use crate::mode::Mode;
    use crate::remap::RemapLookup;
    use pretty_assertions::assert_eq;

    fn args(argument: &str) -> ExArgs {
        ExArgs {
            argument: argument.into(),
            ..Default::default()
        }
    }

    fn run(s: &mut SessionState, command: ExCommand) -> Result<(), ExError> {
        match command {
            ExCommand::Map(cmd) => cmd.execute(s),
            ExCommand::Unmap(cmd) => cmd.execute(s),
            other => panic!("expected a mapping command, got {other:?}"),
        }
    }

    #[test]
    fn test_map_splits_lhs_and_rhs() {
        let ExCommand::Map(cmd) = build_map(args("jk  <Esc>l"), ModeSet::INSERT, true).unwrap()
        else {
            panic!("expected map");
        };
        assert_eq!(cmd.lhs.as_deref(), Some("jk"));
        assert_eq!(cmd.rhs.as_deref(), Some("<Esc>l"));
        assert!(cmd.noremap);
    }

    #[test]
    fn test_map_installs_and_unmap_removes() {
        let mut s = SessionState::new(Box::new(MemoryBuffer::new()));
        run(&mut s, build_map(args("Q dd"), ModeSet::NORMAL, false).unwrap()).unwrap();
        assert!(matches!(
            s.remaps.lookup(Mode::Normal, &parse_keys("Q")),
            RemapLookup::Full(_)
        ));
        run(&mut s, build_unmap(args("Q"), ModeSet::NORMAL).unwrap()).unwrap();
        assert_eq!(s.remaps.lookup(Mode::Normal, &parse_keys("Q")), RemapLookup::NoMatch);

        let err = run(&mut s, build_unmap(args("Q"), ModeSet::NORMAL).unwrap()).unwrap_err();
        assert!(
            matches!(err, ExError::Remap(RemapError::NoSuchMapping(_))),
            "{err:?}"
        );
    }

    #[test]
    fn test_listing() {
        let mut s = SessionState::new(Box::new(MemoryBuffer::new()));
        run(&mut s, build_map(args("gx dd"), ModeSet::NORMAL, true).unwrap()).unwrap();
        run(&mut s, build_map(args("Q <C-w>"), ModeSet::NORMAL, false).unwrap()).unwrap();

        run(&mut s, build_map(args(""), ModeSet::NORMAL, false).unwrap()).unwrap();
        assert_eq!(
            s.message.as_ref().unwrap().text,
            "n  Q            <C-w>\nn  gx          *dd"
        );

        run(&mut s, build_map(args("g"), ModeSet::NORMAL, false).unwrap()).unwrap();
        assert_eq!(s.message.as_ref().unwrap().text, "n  gx          *dd");

        run(&mut s, build_map(args(""), ModeSet::INSERT, false).unwrap()).unwrap();
        assert_eq!(s.message.as_ref().unwrap().text, "No mapping found");
    }

    #[test]
    fn test_unmap_needs_keys() {
        assert!(matches!(
            build_unmap(args("  "), ModeSet::MAP),
            Err(ExError::InvalidArguments(_))
        ));
    }
}
