//! The Ex command dispatch table.

use tracing::debug;

use crate::error::{ExError, ParseError, RegistryError};
use crate::mode::ModeSet;

use super::commands::{self, ExCommand};
use super::range::LineRange;

/// Everything the parser hands a command factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExArgs {
    /// `None` when no range was typed; commands pick their own default.
    pub range: Option<LineRange>,
    pub bang: bool,
    /// Text after the name and `!`, with one leading space removed.
    pub argument: String,
}

pub type CommandFactory = fn(ExArgs) -> Result<ExCommand, ExError>;

#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Shortest accepted prefix of `name`.
    pub abbreviation: &'static str,
    /// Usable in a headless session, without a host that manages files.
    pub standalone: bool,
    pub factory: CommandFactory,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("abbreviation", &self.abbreviation)
            .field("standalone", &self.standalone)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn new(name: &'static str, abbreviation: &'static str, factory: CommandFactory) -> Self {
        Self {
            name,
            abbreviation,
            standalone: true,
            factory,
        }
    }

    /// Mark the command as needing a full host integration.
    pub fn host_only(mut self) -> Self {
        self.standalone = false;
        self
    }

    pub fn build(&self, args: ExArgs) -> Result<ExCommand, ExError> {
        (self.factory)(args)
    }
}

#[derive(Debug, Default)]
pub struct CommandTable {
    specs: Vec<CommandSpec>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        if spec.abbreviation.is_empty() || !spec.name.starts_with(spec.abbreviation) {
            return Err(RegistryError::InvalidAbbreviation {
                name: spec.name.to_string(),
                abbreviation: spec.abbreviation.to_string(),
            });
        }
        if self.specs.iter().any(|s| s.name == spec.name) {
            return Err(RegistryError::DuplicateCommand(spec.name.to_string()));
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

    /// Resolve a typed (possibly abbreviated) command name.
    ///
    /// A full name always wins. Otherwise every command whose abbreviation
    /// the input extends, and whose name the input is a prefix of, is a
    /// candidate; more than one is an error.
    pub fn resolve(&self, input: &str) -> Result<&CommandSpec, ParseError> {
        if let Some(spec) = self.specs.iter().find(|s| s.name == input) {
            return Ok(spec);
        }
        let candidates: Vec<&CommandSpec> = self
            .specs
            .iter()
            .filter(|s| input.len() >= s.abbreviation.len() && s.name.starts_with(input))
            .collect();
        match candidates.as_slice() {
            [] => Err(ParseError::UnknownCommand(input.to_string())),
            [spec] => Ok(spec),
            many => Err(ParseError::AmbiguousCommand {
                input: input.to_string(),
                candidates: many.iter().map(|s| s.name.to_string()).collect(),
            }),
        }
    }

    /// The built-in commands.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut table = Self::new();
        let specs = [
            CommandSpec::new("read", "r", commands::read::build),
            CommandSpec::new("write", "w", commands::write::build).host_only(),
            CommandSpec::new("delete", "d", commands::lines::build_delete),
            CommandSpec::new("yank", "y", commands::lines::build_yank),
            CommandSpec::new("put", "pu", commands::lines::build_put),
            CommandSpec::new("undo", "u", |_| Ok(ExCommand::Undo)),
            CommandSpec::new("redo", "red", |_| Ok(ExCommand::Redo)),
            CommandSpec::new("registers", "reg", commands::listing::build_registers),
            CommandSpec::new("display", "di", commands::listing::build_registers),
            CommandSpec::new("marks", "marks", commands::listing::build_marks),
            CommandSpec::new("quit", "q", |_| Ok(ExCommand::Quit)).host_only(),
            // Mapping family.
            CommandSpec::new("map", "map", |a| commands::mapping::build_map(a, ModeSet::MAP, false)),
            CommandSpec::new("nmap", "nm", |a| commands::mapping::build_map(a, ModeSet::NORMAL, false)),
            CommandSpec::new("vmap", "vm", |a| commands::mapping::build_map(a, ModeSet::VISUAL, false)),
            CommandSpec::new("omap", "om", |a| {
                commands::mapping::build_map(a, ModeSet::OPERATOR_PENDING, false)
            }),
            CommandSpec::new("imap", "im", |a| commands::mapping::build_map(a, ModeSet::INSERT, false)),
            CommandSpec::new("cmap", "cm", |a| {
                commands::mapping::build_map(a, ModeSet::COMMAND_LINE, false)
            }),
            CommandSpec::new("noremap", "no", |a| commands::mapping::build_map(a, ModeSet::MAP, true)),
            CommandSpec::new("nnoremap", "nn", |a| commands::mapping::build_map(a, ModeSet::NORMAL, true)),
            CommandSpec::new("vnoremap", "vn", |a| commands::mapping::build_map(a, ModeSet::VISUAL, true)),
            CommandSpec::new("onoremap", "ono", |a| {
                commands::mapping::build_map(a, ModeSet::OPERATOR_PENDING, true)
            }),
            CommandSpec::new("inoremap", "ino", |a| commands::mapping::build_map(a, ModeSet::INSERT, true)),
            CommandSpec::new("cnoremap", "cno", |a| {
                commands::mapping::build_map(a, ModeSet::COMMAND_LINE, true)
            }),
            CommandSpec::new("unmap", "unm", |a| commands::mapping::build_unmap(a, ModeSet::MAP)),
            CommandSpec::new("nunmap", "nun", |a| commands::mapping::build_unmap(a, ModeSet::NORMAL)),
            CommandSpec::new("vunmap", "vu", |a| commands::mapping::build_unmap(a, ModeSet::VISUAL)),
            CommandSpec::new("ounmap", "ou", |a| {
                commands::mapping::build_unmap(a, ModeSet::OPERATOR_PENDING)
            }),
            CommandSpec::new("iunmap", "iu", |a| commands::mapping::build_unmap(a, ModeSet::INSERT)),
            CommandSpec::new("cunmap", "cu", |a| {
                commands::mapping::build_unmap(a, ModeSet::COMMAND_LINE)
            }),
        ];
        for spec in specs {
            table.register(spec)?;
        }
        debug!(commands = table.len(), "Ex command table built");
        Ok(table)
    }
}
