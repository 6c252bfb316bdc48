//! `:write`: save lines of the buffer to a file.

use std::path::PathBuf;

use tracing::info;

use crate::buffer::{Position, TextRange};
use crate::error::ExError;
use crate::ex::range::LineRange;
use crate::ex::table::ExArgs;
use crate::io::Environment;
use crate::session::SessionState;

use super::ExCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCommand {
    /// Defaults to the whole buffer.
    pub range: Option<LineRange>,
    /// Defaults to the document's own path.
    pub path: Option<PathBuf>,
}

pub fn build(args: ExArgs) -> Result<ExCommand, ExError> {
    let argument = args.argument.trim();
    Ok(ExCommand::Write(WriteCommand {
        range: args.range,
        path: (!argument.is_empty()).then(|| PathBuf::from(argument)),
    }))
}

impl WriteCommand {
    pub async fn execute(self, session: &mut SessionState, env: &Environment) -> Result<(), ExError> {
        let range = self.range.unwrap_or_else(LineRange::whole);
        let (first, last) = range.resolve(session.buffer.as_ref(), &session.marks)?;
        let path = match self.path {
            Some(path) => path,
            None => session
                .buffer
                .path()
                .map(PathBuf::from)
                .ok_or_else(|| ExError::InvalidArguments("no file name".into()))?,
        };
        let path = super::absolute(session, &path);

        let buf = session.buffer.as_ref();
        let (first, last) = (first.max(1) - 1, last.max(1) - 1);
        let mut text = buf.read_range(TextRange::new(
            Position::new(first, 0),
            Position::new(last, buf.line_len(last)),
        ));
        text.push('\n');
        let line_count = last - first + 1;
        let bytes = text.len();

        env.fs.write_text(&path, text).await?;
        info!(path = %path.display(), lines = line_count, "buffer written");
        session.info(format!("\"{}\" {line_count}L, {bytes}B written", path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::ex::range::{Address, LineSpecifier, Separator};
    use crate::io::testing::{FakeFileSystem, FakeProcesses};
    use pretty_assertions::assert_eq;

    fn command(range: Option<LineRange>, argument: &str) -> WriteCommand {
        let args = ExArgs {
            range,
            bang: false,
            argument: argument.into(),
        };
        match build(args).unwrap() {
            ExCommand::Write(cmd) => cmd,
            other => panic!("expected write, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_writes_whole_buffer_to_document_path() {
        let fs = FakeFileSystem::default();
        let env = Environment::new(fs.clone(), FakeProcesses::default());
        let buffer = MemoryBuffer::from_text("a\nb\n").with_path("/docs/x.txt");
        let mut s = SessionState::new(Box::new(buffer));
        command(None, "").execute(&mut s, &env).await.unwrap();
        assert_eq!(fs.contents("/docs/x.txt").as_deref(), Some("a\nb\n"));
        assert_eq!(s.message.unwrap().text, "\"/docs/x.txt\" 2L, 4B written");
    }

    #[tokio::test]
    async fn test_writes_range_to_argument() {
        let fs = FakeFileSystem::default();
        let env = Environment::new(fs.clone(), FakeProcesses::default());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("a\nb\nc")));
        let range = LineRange {
            start: Address::new(LineSpecifier::Number(2)),
            rest: vec![(Separator::Comma, Address::new(LineSpecifier::Last))],
        };
        command(Some(range), "/tmp/out.txt")
            .execute(&mut s, &env)
            .await
            .unwrap();
        assert_eq!(fs.contents("/tmp/out.txt").as_deref(), Some("b\nc\n"));
    }

    #[tokio::test]
    async fn test_relative_path_joins_workspace_root() {
        let fs = FakeFileSystem::default();
        let env = Environment::new(fs.clone(), FakeProcesses::default());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("a")))
            .with_workspace_root("/work");
        command(None, "notes.txt").execute(&mut s, &env).await.unwrap();
        assert_eq!(fs.contents("/work/notes.txt").as_deref(), Some("a\n"));
    }

    #[tokio::test]
    async fn test_untitled_buffer_needs_a_name() {
        let env = Environment::new(FakeFileSystem::default(), FakeProcesses::default());
        let mut s = SessionState::new(Box::new(MemoryBuffer::from_text("a")));
        let err = command(None, "").execute(&mut s, &env).await.unwrap_err();
        assert!(matches!(err, ExError::InvalidArguments(_)), "{err:?}");
    }
}
