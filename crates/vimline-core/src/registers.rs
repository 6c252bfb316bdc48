//! Registers and marks.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::buffer::Position;

pub const UNNAMED: char = '"';
pub const YANK: char = '0';
pub const SMALL_DELETE: char = '-';
pub const BLACK_HOLE: char = '_';
pub const LAST_COMMAND: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Charwise,
    Linewise,
    Blockwise,
}

/// Captured text plus how it was captured.
///
/// Linewise content always ends with a newline; blockwise content holds one
/// line of the block per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub content: String,
    pub kind: RegisterKind,
}

impl Register {
    pub fn charwise(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: RegisterKind::Charwise,
        }
    }

    pub fn linewise(content: impl Into<String>) -> Self {
        let mut content = content.into();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        Self {
            content,
            kind: RegisterKind::Linewise,
        }
    }

    pub fn blockwise(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: RegisterKind::Blockwise,
        }
    }

    fn append(&mut self, more: Register) {
        match (self.kind, more.kind) {
            (RegisterKind::Charwise, RegisterKind::Charwise) => {
                self.content.push_str(&more.content)
            }
            _ => {
                if !self.content.ends_with('\n') {
                    self.content.push('\n');
                }
                self.content.push_str(&more.content);
                if !self.content.ends_with('\n') {
                    self.content.push('\n');
                }
                self.kind = RegisterKind::Linewise;
            }
        }
    }
}

/// Every register selectable with `"x`.
pub fn is_valid_name(name: char) -> bool {
    name.is_ascii_alphanumeric()
        || matches!(name, UNNAMED | SMALL_DELETE | BLACK_HOLE | LAST_COMMAND)
}

/// The register file of one session.
#[derive(Debug, Default)]
pub struct Registers {
    slots: HashMap<char, Register>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register. `None` and `"` both mean the unnamed register.
    pub fn get(&self, name: Option<char>) -> Option<&Register> {
        let name = name.unwrap_or(UNNAMED).to_ascii_lowercase();
        if name == BLACK_HOLE {
            return None;
        }
        self.slots.get(&name)
    }

    /// Store yanked text.
    pub fn store_yank(&mut self, name: Option<char>, register: Register) {
        match writable(name) {
            Some(BLACK_HOLE) => {}
            Some(named) => self.store_named(named, register),
            None => {
                self.slots.insert(YANK, register.clone());
                self.slots.insert(UNNAMED, register);
            }
        }
    }

    /// Store deleted or changed text.
    ///
    /// Without a name, line deletes (and deletes spanning lines) shift the
    /// numbered history `1`..`9`; smaller ones go to `-`.
    pub fn store_delete(&mut self, name: Option<char>, register: Register) {
        match writable(name) {
            Some(BLACK_HOLE) => {}
            Some(named) => self.store_named(named, register),
            None => {
                if register.kind == RegisterKind::Linewise || register.content.contains('\n') {
                    for n in (1..9).rev() {
                        let from = digit(n);
                        if let Some(old) = self.slots.remove(&from) {
                            self.slots.insert(digit(n + 1), old);
                        }
                    }
                    self.slots.insert('1', register.clone());
                } else {
                    self.slots.insert(SMALL_DELETE, register.clone());
                }
                self.slots.insert(UNNAMED, register);
            }
        }
    }

    pub fn set_last_command(&mut self, line: &str) {
        self.slots.insert(LAST_COMMAND, Register::charwise(line));
    }

    /// Non-empty registers in display order.
    pub fn list(&self) -> Vec<(char, &Register)> {
        let order = |c: char| match c {
            UNNAMED => 0,
            '0'..='9' => 1,
            'a'..='z' => 2,
            SMALL_DELETE => 3,
            _ => 4,
        };
        let mut entries: Vec<_> = self.slots.iter().map(|(c, r)| (*c, r)).collect();
        entries.sort_by_key(|(c, _)| (order(*c), *c));
        entries
    }

    fn store_named(&mut self, name: char, register: Register) {
        trace!(register = %name, "storing register");
        let lower = name.to_ascii_lowercase();
        let stored = if name.is_ascii_uppercase() {
            match self.slots.get_mut(&lower) {
                Some(existing) => {
                    existing.append(register);
                    existing.clone()
                }
                None => {
                    self.slots.insert(lower, register.clone());
                    register
                }
            }
        } else {
            self.slots.insert(lower, register.clone());
            register
        };
        self.slots.insert(UNNAMED, stored);
    }
}

/// Resolve a register selector for writing. `None` means the default slots.
fn writable(name: Option<char>) -> Option<char> {
    match name {
        None | Some(UNNAMED) | Some(LAST_COMMAND) => None,
        Some(c) if is_valid_name(c) => Some(c),
        Some(_) => None,
    }
}

fn digit(n: u32) -> char {
    char::from_digit(n, 10).unwrap_or('9')
}

/// Buffer positions remembered by `m{a-z}` and by the last visual selection.
#[derive(Debug, Default)]
pub struct Marks {
    marks: BTreeMap<char, Position>,
}

impl Marks {
    pub const VISUAL_START: char = '<';
    pub const VISUAL_END: char = '>';
    /// Position before the latest jump.
    pub const PREVIOUS: char = '\'';

    pub fn is_settable(name: char) -> bool {
        name.is_ascii_alphabetic()
    }

    pub fn set(&mut self, name: char, pos: Position) {
        let name = if name == '`' { Self::PREVIOUS } else { name };
        self.marks.insert(name, pos);
    }

    pub fn get(&self, name: char) -> Option<Position> {
        let name = if name == '`' { Self::PREVIOUS } else { name };
        self.marks.get(&name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, Position)> + '_ {
        self.marks.iter().map(|(c, p)| (*c, *p))
    }
}
