//! # envup-core
//!
//! Shared library for envup containing the environment-file data model, the
//! line parsers, and the merge rules used when an application upgrade ships a
//! new configuration template.
//!
//! It has zero dependencies on OS APIs, the file system, or external
//! processes: every function here works on in-memory text, so the whole
//! upgrade algorithm can be unit-tested without a scratch directory.
//!
//! # Architecture overview (for beginners)
//!
//! An application keeps its runtime settings in a flat `.env` file of
//! `SECTION_KEY=value` lines.  Each release also ships a template
//! (`.env.example`) describing the settings that release understands, with
//! sensible defaults and explanatory comments.  Upgrading means rewriting the
//! operator's `.env` so that it follows the new template's shape while keeping
//! every value the operator already chose.
//!
//! This crate (`envup-core`) is the foundation.  It defines:
//!
//! - **`domain`** – The data types: [`ConfigKey`] (an explicit
//!   section/key pair), [`ConfigMap`], [`TemplateLine`] and
//!   [`MergedDocument`].
//!
//! - **`parse`** – Turning text into those types.  The operator's file is
//!   parsed leniently (bad lines are skipped and reported); the template is
//!   parsed strictly (bad lines are an error).
//!
//! - **`merge`** – The reconciliation itself: one output line per template
//!   line, operator values win, new keys take the template default, keys the
//!   template no longer declares disappear.

pub mod domain;
pub mod merge;
pub mod parse;

// Re-export the most-used types at the crate root so callers can write
// `envup_core::ConfigMap` instead of `envup_core::domain::config_map::ConfigMap`.
pub use domain::config_map::ConfigMap;
pub use domain::document::MergedDocument;
pub use domain::key::{ConfigEntry, ConfigKey, KeyError};
pub use domain::template::{Template, TemplateLine};
pub use merge::{merge, summarize, MergeSummary};
pub use parse::config_parser::{parse_config, ParsedConfig, SkipReason, SkippedLine};
pub use parse::template_reader::{read_template, TemplateError};
