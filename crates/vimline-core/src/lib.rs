//! vimline-core: a modal (vi-style) input engine.
//!
//! Host key events are normalized into canonical key tokens, passed through
//! the user's remaps, and dispatched against a registry of motions, operators
//! and commands gated by the current mode. Lines typed on the command line
//! are parsed as Ex commands and executed against the [`session::SessionState`].

pub mod actions;
pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod ex;
pub mod history;
pub mod io;
pub mod keys;
pub mod mode;
pub mod recorded;
pub mod registers;
pub mod remap;
pub mod session;


pub use buffer::{MemoryBuffer, Position, TextBuffer};
pub use config::Config;
pub use engine::Engine;
pub use io::Environment;
pub use keys::Key;
pub use mode::Mode;
pub use session::{Capabilities, HostIntegration, SessionState};
