//! Zone collections exchanged with the panel.
//!
//! # Design
//! `ZoneSet` is what `/zones` reports: unique names with no meaningful
//! order, kept sorted so callers render a stable list. `ZoneStates` is what
//! `/control` consumes: flags keyed by zone name. It remembers insertion
//! order because the wire encoding is order-sensitive, and it never pairs
//! names with flags by position.

use std::collections::BTreeSet;

/// Unique zone names reported by the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSet {
    names: BTreeSet<String>,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Build a `ZoneStates` covering every zone, all set to `on`.
    pub fn to_states(&self, on: bool) -> ZoneStates {
        self.iter().map(|name| (name, on)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ZoneSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for ZoneSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Per-zone "on" flags, keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneStates {
    entries: Vec<(String, bool)>,
}

impl ZoneStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag for `name`. An existing entry keeps its position.
    pub fn set(&mut self, name: impl Into<String>, on: bool) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = on,
            None => self.entries.push((name, on)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, on)| *on)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, on)| (n.as_str(), *on))
    }

    /// Names of the zones switched on, in insertion order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, on)| *on).map(|(n, _)| n)
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for ZoneStates {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut states = ZoneStates::new();
        for (name, on) in iter {
            states.set(name, on);
        }
        states
    }
}
