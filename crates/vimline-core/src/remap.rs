//! The remap table.
//!
//! User mappings live in one key trie per mode. The engine feeds the keys it
//! is holding back and gets told whether they map, might map, or never will.

use std::collections::HashMap;

use tracing::debug;

use crate::error::RemapError;
use crate::keys::{render_keys, Key};
use crate::mode::{Mode, ModeSet};

/// Modes that own a trie. Replace mode shares Insert mode's mappings.
const MAP_MODES: [ModeSet; 5] = [
    ModeSet::NORMAL,
    ModeSet::VISUAL,
    ModeSet::OPERATOR_PENDING,
    ModeSet::INSERT,
    ModeSet::COMMAND_LINE,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub lhs: Vec<Key>,
    pub rhs: Vec<Key>,
    /// The expansion is dispatched as-is instead of being remapped again.
    pub noremap: bool,
}

impl Mapping {
    pub fn new(lhs: Vec<Key>, rhs: Vec<Key>, noremap: bool) -> Self {
        Self { lhs, rhs, noremap }
    }
}

#[derive(Debug, Default)]
struct Node {
    mapping: Option<Mapping>,
    children: HashMap<Key, Node>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.mapping.is_none() && self.children.is_empty()
    }

    /// Remove the mapping at `keys`, pruning nodes left empty.
    fn remove(&mut self, keys: &[Key]) -> Option<Mapping> {
        match keys.split_first() {
            None => self.mapping.take(),
            Some((first, rest)) => {
                let child = self.children.get_mut(first)?;
                let removed = child.remove(rest);
                if child.is_empty() {
                    self.children.remove(first);
                }
                removed
            }
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Mapping>) {
        if let Some(mapping) = &self.mapping {
            out.push(mapping);
        }
        for child in self.children.values() {
            child.collect(out);
        }
    }
}

/// Result of looking up held keys.
#[derive(Debug, PartialEq, Eq)]
pub enum RemapLookup<'a> {
    /// No mapping starts with these keys.
    NoMatch,
    /// The keys are a strict prefix of at least one mapping. `longest` is the
    /// longest complete mapping along the way, applied if the wait times out.
    Partial { longest: Option<&'a Mapping> },
    /// A mapping matched. It consumes `lhs.len()` of the held keys; the rest
    /// are evaluated again afterwards.
    Full(&'a Mapping),
}

#[derive(Debug, Default)]
pub struct RemapTable {
    tries: HashMap<ModeSet, Node>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a mapping in every mode of `modes`, replacing older ones.
    pub fn insert(&mut self, modes: ModeSet, mapping: Mapping) -> Result<(), RemapError> {
        if mapping.lhs.is_empty() {
            return Err(RemapError::EmptyKeys);
        }
        debug!(
            lhs = %render_keys(&mapping.lhs),
            rhs = %render_keys(&mapping.rhs),
            noremap = mapping.noremap,
            ?modes,
            "mapping installed"
        );
        for mode in single_modes(modes) {
            let mut node = self.tries.entry(mode).or_default();
            for key in &mapping.lhs {
                node = node.children.entry(key.clone()).or_default();
            }
            node.mapping = Some(mapping.clone());
        }
        Ok(())
    }

    /// Remove the mapping for `lhs` from every mode of `modes`.
    pub fn remove(&mut self, modes: ModeSet, lhs: &[Key]) -> Result<(), RemapError> {
        if lhs.is_empty() {
            return Err(RemapError::EmptyKeys);
        }
        let mut removed = false;
        for mode in single_modes(modes) {
            if let Some(root) = self.tries.get_mut(&mode) {
                removed |= root.remove(lhs).is_some();
            }
        }
        if removed {
            debug!(lhs = %render_keys(lhs), ?modes, "mapping removed");
            Ok(())
        } else {
            Err(RemapError::NoSuchMapping(render_keys(lhs)))
        }
    }

    pub fn lookup(&self, mode: Mode, keys: &[Key]) -> RemapLookup<'_> {
        let Some(mut node) = self.tries.get(&trie_mode(mode)) else {
            return RemapLookup::NoMatch;
        };
        let mut longest = None;
        for key in keys {
            match node.children.get(key) {
                Some(child) => {
                    node = child;
                    if let Some(mapping) = &node.mapping {
                        longest = Some(mapping);
                    }
                }
                // Diverged from every mapping: a shorter complete one still applies.
                None => return longest.map_or(RemapLookup::NoMatch, RemapLookup::Full),
            }
        }
        if node.children.is_empty() {
            longest.map_or(RemapLookup::NoMatch, RemapLookup::Full)
        } else {
            RemapLookup::Partial { longest }
        }
    }

    /// Mappings of the given modes, each tagged with the single mode it
    /// lives in, sorted by mode then left-hand side.
    pub fn mappings(&self, modes: ModeSet) -> Vec<(ModeSet, &Mapping)> {
        let mut out = Vec::new();
        for mode in single_modes(modes) {
            if let Some(root) = self.tries.get(&mode) {
                let mut found = Vec::new();
                root.collect(&mut found);
                found.sort_by(|a, b| a.lhs.cmp(&b.lhs));
                out.extend(found.into_iter().map(|m| (mode, m)));
            }
        }
        out
    }
}

fn trie_mode(mode: Mode) -> ModeSet {
    match mode {
        Mode::Replace => ModeSet::INSERT,
        other => other.mask(),
    }
}

fn single_modes(modes: ModeSet) -> impl Iterator<Item = ModeSet> {
    let modes = if modes.contains(ModeSet::REPLACE) {
        modes | ModeSet::INSERT
    } else {
        modes
    };
    MAP_MODES.into_iter().filter(move |m| modes.contains(*m))
}

/// Short mode tag used when listing mappings.
pub fn mode_tag(mode: ModeSet) -> &'static str {
    if mode == ModeSet::NORMAL {
        "n"
    } else if mode == ModeSet::VISUAL {
        "v"
    } else if mode == ModeSet::OPERATOR_PENDING {
        "o"
    } else if mode == ModeSet::INSERT {
        "i"
    } else if mode == ModeSet::COMMAND_LINE {
        "c"
    } else {
        " "
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_keys;

    fn table(entries: &[(&str, &str)]) -> RemapTable {
        let mut table = RemapTable::new();
        for (lhs, rhs) in entries {
            table
                .insert(
                    ModeSet::NORMAL,
                    Mapping::new(parse_keys(lhs), parse_keys(rhs), false),
                )
                .unwrap();
        }
        table
    }

    #[test]
    fn test_lookup_outcomes() {
        let table = table(&[("jk", "<Esc>"), ("g", "G"), ("gx", "dd")]);
        assert_eq!(table.lookup(Mode::Normal, &parse_keys("x")), RemapLookup::NoMatch);
        assert_eq!(
            table.lookup(Mode::Normal, &parse_keys("j")),
            RemapLookup::Partial { longest: None }
        );
        match table.lookup(Mode::Normal, &parse_keys("jk")) {
            RemapLookup::Full(m) => assert_eq!(render_keys(&m.rhs), "<Esc>"),
            other => panic!("expected full match, got {other:?}"),
        }
        match table.lookup(Mode::Normal, &parse_keys("g")) {
            RemapLookup::Partial { longest: Some(m) } => assert_eq!(render_keys(&m.lhs), "g"),
            other => panic!("expected partial match, got {other:?}"),
        }
    }

    #[test]
    fn test_diverging_key_falls_back_to_shorter_mapping() {
        let table = table(&[("g", "G"), ("gx", "dd")]);
        match table.lookup(Mode::Normal, &parse_keys("gq")) {
            RemapLookup::Full(m) => assert_eq!(render_keys(&m.lhs), "g"),
            other => panic!("expected full match, got {other:?}"),
        }
    }

    #[test]
    fn test_modes_are_separate() {
        let mut table = RemapTable::new();
        table
            .insert(
                ModeSet::INSERT,
                Mapping::new(parse_keys("jk"), parse_keys("<Esc>"), true),
            )
            .unwrap();
        assert_eq!(table.lookup(Mode::Normal, &parse_keys("jk")), RemapLookup::NoMatch);
        assert!(matches!(
            table.lookup(Mode::Replace, &parse_keys("jk")),
            RemapLookup::Full(_)
        ));
    }

    #[test]
    fn test_remove_prunes() {
        let mut table = table(&[("abc", "x")]);
        assert_eq!(
            table.remove(ModeSet::NORMAL, &parse_keys("ab")),
            Err(RemapError::NoSuchMapping("ab".into()))
        );
        table.remove(ModeSet::NORMAL, &parse_keys("abc")).unwrap();
        assert_eq!(table.lookup(Mode::Normal, &parse_keys("a")), RemapLookup::NoMatch);
        assert!(table.mappings(ModeSet::all()).is_empty());
    }

    #[test]
    fn test_empty_lhs_is_rejected() {
        let mut table = RemapTable::new();
        assert_eq!(
            table.insert(ModeSet::NORMAL, Mapping::new(vec![], parse_keys("x"), false)),
            Err(RemapError::EmptyKeys)
        );
    }

    #[test]
    fn test_map_scope_lists_each_mode() {
        let mut table = RemapTable::new();
        table
            .insert(ModeSet::MAP, Mapping::new(parse_keys("Q"), parse_keys("gq"), false))
            .unwrap();
        let tags: Vec<_> = table
            .mappings(ModeSet::all())
            .into_iter()
            .map(|(mode, _)| mode_tag(mode))
            .collect();
        assert_eq!(tags, vec!["n", "v", "o"]);
    }
}
