//! The operator's parsed configuration.
//!
//! [`ConfigMap`] is a two-level mapping `section -> key -> value` built fresh
//! from the operator's environment file on every run.  It is never written to
//! disk as-is; the merge reads from it and the result follows the template's
//! shape instead.
//!
//! # Duplicate keys
//!
//! Inserting a key that already exists replaces the earlier value, so when an
//! environment file declares `APP_KEY` twice the later line wins.  This
//! matches how the application itself reads the file.

use std::collections::HashMap;

use super::key::{ConfigEntry, ConfigKey};

/// Section → key → value mapping of the operator's current settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value for the same key if any.
    pub fn insert(&mut self, key: ConfigKey, value: impl Into<String>) -> Option<String> {
        self.sections
            .entry(key.section().to_string())
            .or_default()
            .insert(key.key().to_string(), value.into())
    }

    /// Inserts a parsed entry.  Later entries overwrite earlier ones.
    pub fn insert_entry(&mut self, entry: ConfigEntry) -> Option<String> {
        self.insert(entry.key, entry.value)
    }

    /// Looks up the value for `key`.
    pub fn get(&self, key: &ConfigKey) -> Option<&str> {
        self.sections
            .get(key.section())
            .and_then(|keys| keys.get(key.key()))
            .map(String::as_str)
    }

    /// Returns `true` if `key` has a value.
    pub fn contains(&self, key: &ConfigKey) -> bool {
        self.get(key).is_some()
    }

    /// Total number of keys across all sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every stored key.  Order is unspecified.
    pub fn keys(&self) -> impl Iterator<Item = ConfigKey> + '_ {
        self.sections.iter().flat_map(|(section, keys)| {
            keys.keys()
                .filter_map(move |key| ConfigKey::new(section, key).ok())
        })
    }
}

impl FromIterator<ConfigEntry> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = ConfigEntry>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        for entry in iter {
            map.insert_entry(entry);
        }
        map
    }
}
