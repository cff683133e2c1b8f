//! Text → domain parsers.
//!
//! Both the operator's file and the template share one line grammar, so the
//! assignment-splitting rule lives in [`line`] and the two readers only differ
//! in how strictly they treat lines that do not fit it:
//!
//! - [`config_parser`] skips bad lines and reports them (the operator's file
//!   may have been hand-edited, and refusing to upgrade over a typo would be
//!   worse than warning about it).
//! - [`template_reader`] rejects bad lines (the template ships with the
//!   release, so a bad line there is a packaging bug).

pub mod config_parser;
pub mod line;
pub mod template_reader;

/// Marker that starts a comment line.
pub const COMMENT_MARKER: char = '#';

/// UTF-8 byte-order mark some editors write at the start of a file.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Drops a leading byte-order mark so the first identifier parses cleanly.
pub(crate) fn strip_bom(contents: &str) -> &str {
    contents.strip_prefix(BYTE_ORDER_MARK).unwrap_or(contents)
}
