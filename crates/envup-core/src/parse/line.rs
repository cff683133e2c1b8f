//! The shared `SECTION_KEY=value` line rule.

use thiserror::Error;

use super::COMMENT_MARKER;
use crate::domain::key::{ConfigEntry, ConfigKey, KeyError};

/// Reasons a non-blank, non-comment line is not a valid assignment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line has no `=` at all.
    #[error("line has no '=' separator")]
    MissingEquals,

    /// The text left of `=` is not a `SECTION_KEY` identifier.
    #[error(transparent)]
    Identifier(#[from] KeyError),
}

/// Classification of a single raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    /// Anything else; still needs [`split_assignment`].
    Candidate(&'a str),
}

/// Classifies a raw line as blank, comment, or assignment candidate.
///
/// The candidate is returned trimmed.
pub fn classify(raw: &str) -> LineKind<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with(COMMENT_MARKER) {
        LineKind::Comment
    } else {
        LineKind::Candidate(trimmed)
    }
}

/// Splits a trimmed line at its first `=` into an identifier and a value.
///
/// Only the first `=` separates; everything after it belongs to the value, so
/// `APP_KEY=base64:abc==` keeps both trailing `=` signs.  The value is trimmed
/// but otherwise taken verbatim: no quoting, escaping or multi-line support.
///
/// # Errors
///
/// Returns [`LineError::MissingEquals`] if there is no `=`, or
/// [`LineError::Identifier`] if the identifier cannot be split into section
/// and key.
pub fn split_assignment(line: &str) -> Result<ConfigEntry, LineError> {
    let (identifier, value) = line.split_once('=').ok_or(LineError::MissingEquals)?;
    let key = ConfigKey::parse(identifier)?;
    Ok(ConfigEntry {
        key,
        value: value.trim().to_string(),
    })
}
