//! Explicit section/key identifiers.
//!
//! An environment file identifier such as `MAIL_FROM_ADDRESS` is split at its
//! first `_` into a section (`mail`) and a key (`from_address`).  Rather than
//! re-deriving that split with a string search every time the identifier is
//! used, [`ConfigKey`] performs the split exactly once and stores both halves.
//!
//! Identifiers are normalised to lower case when parsed and rendered in upper
//! case when written back, so `Mail_Host`, `mail_host` and `MAIL_HOST` all name
//! the same setting.

use std::fmt;

use thiserror::Error;

/// Separator between the section and the key inside an identifier.
pub const SECTION_SEPARATOR: char = '_';

/// Errors produced when an identifier cannot be split into section and key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The identifier is empty after trimming.
    #[error("identifier is empty")]
    Empty,

    /// The identifier has no `_` separator, e.g. `DEBUG`.
    #[error("identifier '{0}' has no '_' separator between section and key")]
    MissingSeparator(String),

    /// The identifier starts with `_`, leaving an empty section.
    #[error("identifier '{0}' has an empty section")]
    EmptySection(String),

    /// The identifier ends at the separator, leaving an empty key.
    #[error("identifier '{0}' has an empty key")]
    EmptyKey(String),
}

/// A configuration identifier decomposed into its section and key.
///
/// Both fields are stored in lower case.  Ordering is by section first, then
/// key, which gives stable output when keys are listed in summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    section: String,
    key: String,
}

impl ConfigKey {
    /// Builds a key from already-separated parts, lower-casing both.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::EmptySection`] or [`KeyError::EmptyKey`] if either
    /// part is empty.
    pub fn new(section: &str, key: &str) -> Result<Self, KeyError> {
        let section = section.trim().to_ascii_lowercase();
        let key = key.trim().to_ascii_lowercase();
        if section.is_empty() {
            return Err(KeyError::EmptySection(format!("_{key}")));
        }
        if key.is_empty() {
            return Err(KeyError::EmptyKey(format!("{section}_")));
        }
        Ok(Self { section, key })
    }

    /// Parses a flat identifier such as `MAIL_HOST`, splitting at the first `_`.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] describing why the identifier cannot be split.
    pub fn parse(identifier: &str) -> Result<Self, KeyError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(KeyError::Empty);
        }
        let lowered = identifier.to_ascii_lowercase();
        let (section, key) = lowered
            .split_once(SECTION_SEPARATOR)
            .ok_or_else(|| KeyError::MissingSeparator(identifier.to_string()))?;
        if section.is_empty() {
            return Err(KeyError::EmptySection(identifier.to_string()));
        }
        if key.is_empty() {
            return Err(KeyError::EmptyKey(identifier.to_string()));
        }
        Ok(Self {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    /// The section part, e.g. `mail` for `MAIL_HOST`.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// The key part, e.g. `host` for `MAIL_HOST`.  May itself contain `_`.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ConfigKey {
    /// Renders the identifier the way it appears in an environment file:
    /// upper case, section and key joined by `_`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.section.to_ascii_uppercase(),
            SECTION_SEPARATOR,
            self.key.to_ascii_uppercase()
        )
    }
}

/// One parsed `SECTION_KEY=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// The decomposed identifier.
    pub key: ConfigKey,
    /// The value, trimmed of surrounding whitespace and otherwise verbatim.
    pub value: String,
}

impl ConfigEntry {
    /// Renders the entry as a single environment-file line.
    pub fn to_line(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}
