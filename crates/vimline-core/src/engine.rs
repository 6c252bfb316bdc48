//! The input pipeline: key events in, edits out.
//!
//! Keys first go through the remap stage. Keys that might start a mapping
//! are held back until the mapping completes, diverges, or the remap timeout
//! expires. Whatever comes out is dispatched one key at a time, and a
//! submitted command line is parsed and run as an Ex command.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::actions::ActionRegistry;
use crate::config::Config;
use crate::dispatch::{clamp_cursor, dispatch, DispatchOutcome};
use crate::error::{ExError, RegistryError, RemapError};
use crate::ex::{self, CommandTable};
use crate::io::Environment;
use crate::keys::{normalize, parse_keys, render_keys, Key};
use crate::mode::Mode;
use crate::remap::{Mapping, RemapLookup};
use crate::session::{HostIntegration, SessionState};

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_REMAP_DEPTH: usize = 1000;

/// A key waiting to be remapped or dispatched.
#[derive(Debug, Clone)]
struct Typed {
    key: Key,
    /// False for keys produced by a non-recursive mapping.
    remap: bool,
    /// Number of expansions that produced this key.
    depth: usize,
}

impl Typed {
    fn user(key: Key) -> Self {
        Self {
            key,
            remap: true,
            depth: 0,
        }
    }
}

/// What to do with the held keys once their lookup is final.
enum Resolution {
    Expand(Mapping),
    Literal,
}

pub struct Engine {
    registry: Arc<ActionRegistry>,
    commands: Arc<CommandTable>,
    env: Environment,
    pub session: SessionState,
    typeahead: VecDeque<Typed>,
    /// Keys that form a strict prefix of some mapping.
    held: Vec<Typed>,
    deadline: Option<Instant>,
    timeout: Duration,
    max_remap_depth: usize,
}

impl Engine {
    /// An engine with the default actions and Ex commands.
    pub fn new(session: SessionState, env: Environment) -> Result<Self, RegistryError> {
        let registry = Arc::new(ActionRegistry::with_defaults()?);
        let commands = Arc::new(CommandTable::with_defaults()?);
        Ok(Self::with_tables(registry, commands, session, env))
    }

    /// Share already-built tables between sessions.
    pub fn with_tables(
        registry: Arc<ActionRegistry>,
        commands: Arc<CommandTable>,
        session: SessionState,
        env: Environment,
    ) -> Self {
        Self {
            registry,
            commands,
            env,
            session,
            typeahead: VecDeque::new(),
            held: Vec::new(),
            deadline: None,
            timeout: DEFAULT_TIMEOUT,
            max_remap_depth: DEFAULT_MAX_REMAP_DEPTH,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_remap_depth(mut self, depth: usize) -> Self {
        self.max_remap_depth = depth;
        self
    }

    /// Apply the remap settings of `config`. Mappings themselves are
    /// installed into the session's table by [`Config::install_mappings`].
    pub fn configured(self, config: &Config) -> Self {
        self.with_timeout(config.remap_timeout())
            .with_max_remap_depth(config.max_remap_depth)
    }

    /// When held keys stop waiting for the rest of a mapping.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn should_quit(&self) -> bool {
        self.session.quit_requested
    }

    pub async fn handle_event(&mut self, event: &KeyEvent) {
        if let Some(key) = normalize(event) {
            self.feed(key).await;
        }
    }

    pub async fn feed(&mut self, key: Key) {
        trace!(%key, "key received");
        self.typeahead.push_back(Typed::user(key));
        self.process().await;
    }

    /// Feed keys written in `<C-x>` notation, as if typed.
    pub async fn feed_keys(&mut self, notation: &str) {
        self.typeahead
            .extend(parse_keys(notation).into_iter().map(Typed::user));
        self.process().await;
    }

    /// Give up waiting for a longer mapping: apply the longest complete one
    /// along the held keys, or dispatch them as typed.
    pub async fn expire_timeout(&mut self) {
        if self.held.is_empty() {
            self.deadline = None;
            return;
        }
        debug!(held = %self.held_keys(), "remap timeout expired");
        self.resolve_held(true).await;
        self.process().await;
    }

    fn held_keys(&self) -> String {
        let keys: Vec<Key> = self.held.iter().map(|t| t.key.clone()).collect();
        render_keys(&keys)
    }

    /// Keys that are arguments (a register name, the `{char}` of `f{char}`)
    /// are never remapped.
    fn takes_literal(&self) -> bool {
        self.session.recorded.awaiting_register || self.session.recorded.awaiting_char
    }

    async fn process(&mut self) {
        while let Some(typed) = self.typeahead.pop_front() {
            if !typed.remap || self.takes_literal() {
                if !self.held.is_empty() {
                    self.typeahead.push_front(typed);
                    self.resolve_held(true).await;
                    continue;
                }
                self.dispatch_key(typed.key).await;
                continue;
            }
            self.held.push(typed);
            self.resolve_held(false).await;
        }
    }

    /// Look the held keys up in the remap table and act on the answer. A
    /// strict prefix keeps waiting unless `timed_out`.
    async fn resolve_held(&mut self, timed_out: bool) {
        if self.held.is_empty() {
            return;
        }
        let keys: Vec<Key> = self.held.iter().map(|t| t.key.clone()).collect();
        let resolution = match self.session.remaps.lookup(self.session.mode(), &keys) {
            RemapLookup::Partial { .. } if !timed_out => {
                // Every key that extends the prefix restarts the wait.
                self.deadline = Some(Instant::now() + self.timeout);
                trace!(held = %render_keys(&keys), "waiting for the rest of a mapping");
                return;
            }
            RemapLookup::Full(mapping) | RemapLookup::Partial { longest: Some(mapping) } => {
                Resolution::Expand(mapping.clone())
            }
            RemapLookup::Partial { longest: None } | RemapLookup::NoMatch => Resolution::Literal,
        };
        self.deadline = None;

        match resolution {
            Resolution::Expand(mapping) => self.expand(mapping),
            Resolution::Literal => {
                let first = self.held.remove(0);
                // The rest may still start a mapping of their own.
                for typed in self.held.drain(..).rev() {
                    self.typeahead.push_front(typed);
                }
                self.dispatch_key(first.key).await;
            }
        }
    }

    /// Replace the mapped keys with the right-hand side, in front of any
    /// keys still waiting.
    fn expand(&mut self, mapping: Mapping) {
        let consumed: Vec<Typed> = self.held.drain(..mapping.lhs.len()).collect();
        let depth = consumed.iter().map(|t| t.depth).max().unwrap_or(0) + 1;
        if depth > self.max_remap_depth {
            let err = RemapError::RecursionLimit(self.max_remap_depth);
            warn!(lhs = %render_keys(&mapping.lhs), "{err}");
            self.session.error(err.to_string());
            self.held.clear();
            self.typeahead.clear();
            return;
        }
        trace!(
            lhs = %render_keys(&mapping.lhs),
            rhs = %render_keys(&mapping.rhs),
            depth,
            "expanding mapping"
        );
        // `nmap j gj`-style mappings whose expansion starts with their own
        // trigger don't remap that part again.
        let literal_prefix = if mapping.rhs.starts_with(&mapping.lhs) {
            mapping.lhs.len()
        } else {
            0
        };
        let rest: Vec<Typed> = self.held.drain(..).collect();
        for typed in rest.into_iter().rev() {
            self.typeahead.push_front(typed);
        }
        for (i, key) in mapping.rhs.into_iter().enumerate().rev() {
            self.typeahead.push_front(Typed {
                key,
                remap: !mapping.noremap && i >= literal_prefix,
                depth,
            });
        }
    }

    async fn dispatch_key(&mut self, key: Key) {
        let outcome = dispatch(&self.registry, &mut self.session, key);
        trace!(?outcome, mode = %self.session.mode(), "dispatched");
        if let DispatchOutcome::Submit(line) = outcome {
            if self.session.mode().is_visual() {
                self.session.return_to_normal();
            }
            if let Err(err) = self.execute_command_line(&line).await {
                debug!(%line, %err, "Ex command failed");
                self.session.error(err.to_string());
            }
        }
    }

    /// Parse and run one Ex command line. The session is left untouched when
    /// parsing or argument validation fails.
    pub async fn execute_command_line(&mut self, line: &str) -> Result<(), ExError> {
        if !line.trim().is_empty() {
            self.session.registers.set_last_command(line);
        }
        let parsed = ex::parse(&self.commands, line)?;
        if let Some(spec) = parsed.spec {
            if !spec.standalone && self.session.capabilities.host == HostIntegration::Headless {
                return Err(ExError::Unsupported(spec.name));
            }
        }
        let Some(command) = parsed.build()? else {
            return Ok(());
        };

        let modifies = command.modifies();
        if modifies {
            self.session.begin_change();
        }
        let result = command.execute(&mut self.session, &self.env).await;
        if modifies {
            self.session.commit_change();
        }
        if !self.session.mode().is_typing() {
            clamp_cursor(self.session.buffer.as_mut());
        }
        result
    }
}
