//! ConfigMerger: reconciles the operator's settings with a new template.
//!
//! # The rule (for beginners)
//!
//! The template decides the *shape* of the upgraded file; the operator's file
//! decides the *values*.  Walking the template top to bottom:
//!
//! | Template line           | Output line                                   |
//! |-------------------------|-----------------------------------------------|
//! | comment / blank         | copied unchanged                              |
//! | `KEY=default`, known    | `KEY=<operator's value>`                      |
//! | `KEY=default`, unknown  | `KEY=<default>` (new in this release)         |
//!
//! Keys the operator had but the template no longer declares are not written.
//! They are still readable from the backup file the writer creates.
//!
//! The merge is a pure function: same inputs, same output, and the operator's
//! [`ConfigMap`] is only read.

use std::collections::HashSet;

use crate::domain::config_map::ConfigMap;
use crate::domain::document::MergedDocument;
use crate::domain::key::{ConfigEntry, ConfigKey};
use crate::domain::template::{Template, TemplateLine};

/// Merges the operator's settings into the template's shape.
///
/// The result has exactly one line per template line, in template order.
/// When the template declares a key more than once and the operator has no
/// value for it, every occurrence renders the last default declared.
pub fn merge(existing: &ConfigMap, template: &Template) -> MergedDocument {
    let defaults = template.effective_defaults();

    let lines = template
        .lines()
        .iter()
        .map(|line| match line {
            TemplateLine::Comment(text) | TemplateLine::Blank(text) => text.clone(),
            TemplateLine::Assignment { key, default } => {
                let value = existing
                    .get(key)
                    .or_else(|| defaults.get(key).copied())
                    .unwrap_or(default.as_str());
                ConfigEntry {
                    key: key.clone(),
                    value: value.to_string(),
                }
                .to_line()
            }
        })
        .collect();

    MergedDocument::new(lines)
}

/// What an upgrade did to each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Keys whose operator value was carried over, in template order.
    pub retained: Vec<ConfigKey>,
    /// Keys new to the operator that took the template default, in template order.
    pub introduced: Vec<ConfigKey>,
    /// Operator keys the template no longer declares, sorted.
    pub dropped: Vec<ConfigKey>,
}

impl MergeSummary {
    /// Returns `true` if the upgrade neither added nor removed any key.
    pub fn is_unchanged(&self) -> bool {
        self.introduced.is_empty() && self.dropped.is_empty()
    }
}

/// Classifies every key touched by [`merge`] for reporting.
pub fn summarize(existing: &ConfigMap, template: &Template) -> MergeSummary {
    let mut summary = MergeSummary::default();
    let mut seen = HashSet::new();

    for (key, _) in template.assignments() {
        if !seen.insert(key) {
            continue;
        }
        if existing.contains(key) {
            summary.retained.push(key.clone());
        } else {
            summary.introduced.push(key.clone());
        }
    }

    summary.dropped = existing.keys().filter(|key| !seen.contains(key)).collect();
    summary.dropped.sort();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::config_parser::parse_config;
    use crate::parse::template_reader::read_template;

    fn key(identifier: &str) -> ConfigKey {
        ConfigKey::parse(identifier).unwrap()
    }

    #[test]
    fn test_merge_mail_scenario() {
        // Arrange
        let existing = parse_config("MAIL_HOST=smtp.old.com\nMAIL_PORT=25\n").map;
        let template = read_template(
            "# Mail settings\nMAIL_HOST=smtp.example.com\nMAIL_PORT=587\nMAIL_ENCRYPTION=tls\n",
        )
        .unwrap();

        // Act
        let merged = merge(&existing, &template);

        // Assert
        assert_eq!(
            merged.lines(),
            &[
                "# Mail settings",
                "MAIL_HOST=smtp.old.com",
                "MAIL_PORT=25",
                "MAIL_ENCRYPTION=tls",
            ]
        );
    }

    #[test]
    fn test_merge_drops_keys_not_in_template() {
        let existing = parse_config("APP_ENV=local\nLEGACY_FLAG=1\n").map;
        let template = read_template("APP_ENV=production\n").unwrap();

        let merged = merge(&existing, &template);

        assert_eq!(merged.lines(), &["APP_ENV=local"]);
    }

    #[test]
    fn test_merge_one_output_line_per_template_line() {
        let existing = ConfigMap::new();
        let template = read_template("# a\n\n  \nDB_HOST=127.0.0.1\n# b\n").unwrap();

        let merged = merge(&existing, &template);

        assert_eq!(merged.len(), template.len());
        assert_eq!(merged.lines()[2], "  ");
    }

    #[test]
    fn test_merge_duplicate_template_key_uses_last_default() {
        let existing = ConfigMap::new();
        let template = read_template("APP_ENV=local\nAPP_ENV=production\n").unwrap();

        let merged = merge(&existing, &template);

        assert_eq!(merged.lines(), &["APP_ENV=production", "APP_ENV=production"]);
    }

    #[test]
    fn test_merge_duplicate_template_key_prefers_operator_value() {
        let existing = parse_config("APP_ENV=staging\n").map;
        let template = read_template("APP_ENV=local\nAPP_ENV=production\n").unwrap();

        let merged = merge(&existing, &template);

        assert_eq!(merged.lines(), &["APP_ENV=staging", "APP_ENV=staging"]);
    }

    #[test]
    fn test_merge_renders_identifier_in_upper_case() {
        let existing = parse_config("mail_host=lower.example\n").map;
        let template = read_template("Mail_Host=x\n").unwrap();

        assert_eq!(merge(&existing, &template).lines(), &["MAIL_HOST=lower.example"]);
    }

    #[test]
    fn test_merge_does_not_mutate_existing() {
        let existing = parse_config("MAIL_HOST=a\n").map;
        let before = existing.clone();
        let template = read_template("MAIL_HOST=b\nMAIL_PORT=1\n").unwrap();

        let _ = merge(&existing, &template);

        assert_eq!(existing, before);
    }

    #[test]
    fn test_summarize_classifies_keys() {
        let existing = parse_config("MAIL_HOST=a\nMAIL_PORT=25\nOLD_SETTING=x\n").map;
        let template =
            read_template("MAIL_HOST=b\nMAIL_PORT=587\nMAIL_ENCRYPTION=tls\nMAIL_HOST=c\n")
                .unwrap();

        let summary = summarize(&existing, &template);

        assert_eq!(summary.retained, vec![key("MAIL_HOST"), key("MAIL_PORT")]);
        assert_eq!(summary.introduced, vec![key("MAIL_ENCRYPTION")]);
        assert_eq!(summary.dropped, vec![key("OLD_SETTING")]);
        assert!(!summary.is_unchanged());
    }

    #[test]
    fn test_summarize_converged_file_is_unchanged() {
        let template = read_template("APP_ENV=production\n").unwrap();
        let existing = parse_config("APP_ENV=local\n").map;

        assert!(summarize(&existing, &template).is_unchanged());
    }
}
