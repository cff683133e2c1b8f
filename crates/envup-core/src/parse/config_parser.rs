//! ConfigParser: the operator's environment file → [`ConfigMap`].
//!
//! Every non-blank line of the form `SECTION_KEY=value` becomes one entry.
//! Blank lines and comment lines are ignored.  Lines that cannot be split into
//! an identifier and a value are skipped, logged with `warn!`, and returned in
//! [`ParsedConfig::skipped`] so the caller can report them; they are never
//! guessed at or re-partitioned.

use tracing::warn;

use super::line::{classify, split_assignment, LineError, LineKind};
use super::strip_bom;
use crate::domain::config_map::ConfigMap;

/// Why a line of the operator's file was skipped.
pub type SkipReason = LineError;

/// A line of the operator's file that did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the source file.
    pub line_number: usize,
    /// The line as it appeared, trimmed.
    pub text: String,
    pub reason: SkipReason,
}

/// Result of parsing the operator's file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    pub map: ConfigMap,
    pub skipped: Vec<SkippedLine>,
}

/// Parses the contents of an environment file.
///
/// Duplicate keys follow last-write-wins: the value from the later line is
/// kept.
pub fn parse_config(contents: &str) -> ParsedConfig {
    let mut parsed = ParsedConfig::default();

    for (index, raw) in strip_bom(contents).lines().enumerate() {
        let line = match classify(raw) {
            LineKind::Blank | LineKind::Comment => continue,
            LineKind::Candidate(line) => line,
        };

        match split_assignment(line) {
            Ok(entry) => {
                parsed.map.insert_entry(entry);
            }
            Err(reason) => {
                warn!(line = index + 1, %reason, "skipping malformed configuration line");
                parsed.skipped.push(SkippedLine {
                    line_number: index + 1,
                    text: line.to_string(),
                    reason,
                });
            }
        }
    }

    parsed
}
