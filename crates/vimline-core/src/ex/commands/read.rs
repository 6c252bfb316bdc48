//! `:read`: insert a file, or the output of a shell command, into the buffer.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::actions::operator::put_lines;
use crate::buffer::advance;
use crate::error::ExError;
use crate::ex::range::LineRange;
use crate::ex::table::ExArgs;
use crate::io::Environment;
use crate::session::SessionState;

use super::ExCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    File(PathBuf),
    Shell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCommand {
    pub range: Option<LineRange>,
    pub source: ReadSource,
}

/// `:r file`, `:r! cmd` and `:r !cmd`. The argument is taken as typed,
/// apart from trailing whitespace.
pub fn build(args: ExArgs) -> Result<ExCommand, ExError> {
    let argument = args.argument.trim_end();
    let (source, given) = if args.bang {
        (ReadSource::Shell(argument.to_string()), argument)
    } else if let Some(command) = argument.strip_prefix('!') {
        (ReadSource::Shell(command.to_string()), command)
    } else {
        (ReadSource::File(PathBuf::from(argument)), argument)
    };
    if given.trim_start().is_empty() {
        return Err(ExError::InvalidArguments(
            "read needs a file name or a command".into(),
        ));
    }
    Ok(ExCommand::Read(ReadCommand {
        range: args.range,
        source,
    }))
}

impl ReadCommand {
    pub async fn execute(self, session: &mut SessionState, env: &Environment) -> Result<(), ExError> {
        // Resolve first so a bad address fails before any I/O.
        let below = match &self.range {
            Some(range) => Some(range.resolve(session.buffer.as_ref(), &session.marks)?.1),
            None => None,
        };
        let text = match &self.source {
            ReadSource::File(path) => {
                let path = super::absolute(session, path);
                debug!(path = %path.display(), "reading file into buffer");
                env.fs.read_text(&path).await?
            }
            ReadSource::Shell(command) if !session.capabilities.shell_commands => {
                info!(%command, "shell commands are disabled; nothing read");
                String::new()
            }
            ReadSource::Shell(command) => {
                let cwd = session.working_directory();
                debug!(%command, cwd = ?cwd, "reading command output into buffer");
                env.processes.run(command, cwd.as_deref()).await?
            }
        };
        if text.is_empty() {
            return Ok(());
        }
        insert(session, below, &text);
        Ok(())
    }
}

/// Without an address the text goes in at the cursor, which ends up just
/// after it. With one it becomes whole lines below the addressed line (`0`
/// meaning above the first).
fn insert(session: &mut SessionState, below: Option<usize>, text: &str) {
    let buf = session.buffer.as_mut();
    match below {
        None => {
            let at = buf.cursor();
            buf.insert_at(at, text);
            buf.set_cursor(advance(at, text));
        }
        Some(line) => {
            let mut lines = text.to_string();
            if !lines.ends_with('\n') {
                lines.push('\n');
            }
            if line == 0 {
                put_lines(buf, 0, &lines, true);
            } else {
                put_lines(buf, line - 1, &lines, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{MemoryBuffer, Position};
    use crate::ex::range::{Address, LineSpecifier};
    use crate::io::testing::{FakeFileSystem, FakeProcesses};
    use pretty_assertions::assert_eq;

    fn args(bang: bool, argument: &str) -> ExArgs {
        ExArgs {
            range: None,
            bang,
            argument: argument.into(),
        }
    }

    fn command(bang: bool, argument: &str) -> ReadCommand {
        match build(args(bang, argument)).unwrap() {
            ExCommand::Read(cmd) => cmd,
            other => panic!("expected read, got {other:?}"),
        }
    }

    fn lines(s: &SessionState) -> Vec<String> {
        s.buffer.text().split('\n').map(String::from).collect()
    }

    #[test]
    fn test_build_sources() {
        assert_eq!(
            command(false, "notes.txt").source,
            ReadSource::File("notes.txt".into())
        );
        assert_eq!(command(true, "ls -1").source, ReadSource::Shell("ls -1".into()));
        assert_eq!(command(false, "!ls -1").source, ReadSource::Shell("ls -1".into()));
        assert_eq!(
            command(false, " notes.txt  ").source,
            ReadSource::File(" notes.txt".into())
        );
        assert_eq!(
            command(true, " echo  hi ").source,
            ReadSource::Shell(" echo  hi".into())
        );
    }

    #[test]
    fn test_build_needs_an_argument() {
        for (bang, argument) in [(false, ""), (true, ""), (false, "  "), (false, "!")] {
            assert!(
                matches!(build(args(bang, argument)), Err(ExError::InvalidArguments(_))),
                "{bang} {argument:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_file_goes_in_at_cursor() {
        let env = Environment::new(
            FakeFileSystem::with_file("/tmp/in.txt", "one\ntwo\n"),
            FakeProcesses::default(),
        );
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("abc")));
        s.buffer.set_cursor(Position::new(0, 1));
        command(false, "/tmp/in.txt").execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["aone", "two", "bc"]);
        assert_eq!(s.buffer.cursor(), Position::new(2, 0));
    }

    #[tokio::test]
    async fn test_address_inserts_below_line() {
        let env = Environment::new(
            FakeFileSystem::with_file("/tmp/in.txt", "new"),
            FakeProcesses::default(),
        );
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("a\nb\nc")));

        let mut cmd = command(false, "/tmp/in.txt");
        cmd.range = Some(LineRange::single(Address::new(LineSpecifier::Number(2))));
        cmd.clone().execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["a", "b", "new", "c"]);
        assert_eq!(s.buffer.cursor(), Position::new(2, 0));

        cmd.range = Some(LineRange::single(Address::new(LineSpecifier::Last)));
        cmd.clone().execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["a", "b", "new", "c", "new"]);

        cmd.range = Some(LineRange::single(Address::new(LineSpecifier::Number(0))));
        cmd.execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["new", "a", "b", "new", "c", "new"]);
        assert_eq!(s.buffer.cursor(), Position::new(0, 0));
    }

    #[tokio::test]
    async fn test_missing_file_leaves_buffer_alone() {
        let env = Environment::new(FakeFileSystem::default(), FakeProcesses::default());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("abc")));
        let err = command(false, "/nope").execute(&mut s, &env).await.unwrap_err();
        assert!(matches!(err, ExError::File(_)), "{err:?}");
        assert_eq!(lines(&s), vec!["abc"]);
    }

    #[tokio::test]
    async fn test_shell_runs_in_workspace_root() {
        let processes = FakeProcesses::with_output("date", "today\n");
        let env = Environment::new(FakeFileSystem::default(), processes.clone());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("abc")))
            .with_workspace_root("/work");
        command(true, "date").execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["today", "abc"]);
        assert_eq!(
            processes.calls(),
            vec![("date".to_string(), Some(PathBuf::from("/work")))]
        );
    }

    #[tokio::test]
    async fn test_shell_disabled_inserts_nothing() {
        let processes = FakeProcesses::with_output("date", "today\n");
        let env = Environment::new(FakeFileSystem::default(), processes.clone());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("abc")));
        s.capabilities.shell_commands = false;
        command(true, "date").execute(&mut s, &env).await.unwrap();
        assert_eq!(lines(&s), vec!["abc"]);
        assert!(processes.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_leaves_buffer_alone() {
        let env = Environment::new(FakeFileSystem::default(), FakeProcesses::default());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("abc")));
        let err = command(true, "false").execute(&mut s, &env).await.unwrap_err();
        assert!(matches!(err, ExError::Process(_)), "{err:?}");
        assert_eq!(lines(&s), vec!["abc"]);
    }
}
