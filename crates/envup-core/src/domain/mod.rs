//! Domain entities for envup.
//!
//! This module contains pure data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Describes the concepts the program is about: here, configuration keys,
//!   the operator's current settings, the lines of a shipped template, and the
//!   merged document that will replace the operator's file.
//! - Has **no** imports from OS APIs, file-system helpers, or process
//!   runners.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (the `envup` binary's application and infrastructure
//! modules) depends on the domain, but the domain never depends on them.

/// Section/key identifiers and single parsed entries.
pub mod key;

/// The operator's parsed configuration: section → key → value.
pub mod config_map;

/// The shipped template as an ordered list of lines.
pub mod template;

/// The merge output: ordered lines ready to be written to disk.
pub mod document;
