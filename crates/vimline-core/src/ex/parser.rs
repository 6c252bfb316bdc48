//! Tokenize an Ex command line: `[range] name[!] [argument]`.

use tracing::trace;

use crate::error::{ExError, ParseError};

use super::commands::ExCommand;
use super::range::{self, LineRange};
use super::table::{CommandSpec, CommandTable, ExArgs};

/// One parsed command line.
#[derive(Debug, Clone)]
pub struct ParsedCommand<'a> {
    pub range: Option<LineRange>,
    /// `None` for a line with no command name: a bare range or nothing.
    pub spec: Option<&'a CommandSpec>,
    pub bang: bool,
    pub argument: String,
}

impl ParsedCommand<'_> {
    /// Build the handler. A bare range becomes a jump; an empty line has
    /// nothing to run.
    pub fn build(self) -> Result<Option<ExCommand>, ExError> {
        match (self.spec, self.range) {
            (Some(spec), range) => spec
                .build(ExArgs {
                    range,
                    bang: self.bang,
                    argument: self.argument,
                })
                .map(Some),
            (None, Some(range)) => Ok(Some(ExCommand::Goto(range))),
            (None, None) => Ok(None),
        }
    }
}

pub fn parse<'a>(table: &'a CommandTable, line: &str) -> Result<ParsedCommand<'a>, ParseError> {
    let line = line.trim_start().trim_start_matches(':').trim_start();
    let (range, rest) = range::parse(line)?;
    let rest = rest.trim_start();

    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (name, rest) = rest.split_at(name_len);
    if name.is_empty() {
        if !rest.trim().is_empty() {
            return Err(ParseError::TrailingCharacters(rest.trim().to_string()));
        }
        return Ok(ParsedCommand {
            range,
            spec: None,
            bang: false,
            argument: String::new(),
        });
    }

    let spec = table.resolve(name)?;
    let (bang, rest) = match rest.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let argument = rest.strip_prefix(' ').unwrap_or(rest).to_string();
    trace!(command = spec.name, bang, %argument, "parsed command line");
    Ok(ParsedCommand {
        range,
        spec: Some(spec),
        bang,
        argument,
    })
}
