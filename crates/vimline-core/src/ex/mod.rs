//! The Ex command line: range parsing, name resolution and the handlers.

pub mod commands;
pub mod parser;
pub mod range;
pub mod table;

pub use commands::ExCommand;
pub use parser::{parse, ParsedCommand};
pub use range::{Address, LineRange, LineSpecifier, Separator};
pub use table::{CommandSpec, CommandTable, ExArgs};
