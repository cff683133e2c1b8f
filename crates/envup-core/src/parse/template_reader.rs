//! TemplateReader: `.env.example` contents → [`Template`].
//!
//! Each raw line becomes exactly one [`TemplateLine`].  Comment and blank
//! lines keep their original text so the upgraded file is visually stable
//! across runs.  Assignment lines use the same splitting rule as the
//! operator's file and keep the template's own value as the default.

use thiserror::Error;

use super::line::{classify, split_assignment, LineError, LineKind};
use super::strip_bom;
use crate::domain::template::{Template, TemplateLine};

/// Errors produced while reading the template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A non-comment line does not follow the `SECTION_KEY=value` grammar.
    #[error("template line {line_number} '{text}' is malformed: {reason}")]
    MalformedLine {
        line_number: usize,
        text: String,
        #[source]
        reason: LineError,
    },
}

/// Reads template contents into an ordered [`Template`].
///
/// # Errors
///
/// Returns [`TemplateError::MalformedLine`] for the first line that is neither
/// blank, a comment, nor a valid assignment.
pub fn read_template(contents: &str) -> Result<Template, TemplateError> {
    let mut lines = Vec::new();

    for (index, raw) in strip_bom(contents).lines().enumerate() {
        let line = match classify(raw) {
            LineKind::Blank => TemplateLine::Blank(raw.to_string()),
            LineKind::Comment => TemplateLine::Comment(raw.to_string()),
            LineKind::Candidate(candidate) => {
                let entry =
                    split_assignment(candidate).map_err(|reason| TemplateError::MalformedLine {
                        line_number: index + 1,
                        text: candidate.to_string(),
                        reason,
                    })?;
                TemplateLine::Assignment {
                    key: entry.key,
                    default: entry.value,
                }
            }
        };
        lines.push(line);
    }

    Ok(Template::new(lines))
}
