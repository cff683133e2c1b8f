//! The shipped configuration template.
//!
//! A template is an ordered list of [`TemplateLine`]s.  Unlike the operator's
//! [`ConfigMap`](super::config_map::ConfigMap), order, comments and blank lines
//! all matter here: the template defines exactly what the upgraded file will
//! look like, line for line.

use std::collections::HashMap;

use super::key::ConfigKey;

/// One line of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLine {
    /// A comment line, kept byte for byte (including any leading whitespace).
    Comment(String),
    /// A line that is empty after trimming.  The raw text is kept so that
    /// whitespace-only lines are reproduced exactly.
    Blank(String),
    /// A `SECTION_KEY=default` assignment.
    Assignment {
        key: ConfigKey,
        /// The value the template ships with, used for keys the operator has
        /// never set.
        default: String,
    },
}

/// An ordered template, as read from `.env.example`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    lines: Vec<TemplateLine>,
}

impl Template {
    pub fn new(lines: Vec<TemplateLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[TemplateLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates over the assignment lines in template order.
    pub fn assignments(&self) -> impl Iterator<Item = (&ConfigKey, &str)> {
        self.lines.iter().filter_map(|line| match line {
            TemplateLine::Assignment { key, default } => Some((key, default.as_str())),
            TemplateLine::Comment(_) | TemplateLine::Blank(_) => None,
        })
    }

    /// Returns the effective default of every declared key.
    ///
    /// When a key is declared more than once, the last declaration wins.
    pub fn effective_defaults(&self) -> HashMap<&ConfigKey, &str> {
        let mut defaults = HashMap::new();
        for (key, default) in self.assignments() {
            defaults.insert(key, default);
        }
        defaults
    }
}

impl From<Vec<TemplateLine>> for Template {
    fn from(lines: Vec<TemplateLine>) -> Self {
        Self::new(lines)
    }
}
