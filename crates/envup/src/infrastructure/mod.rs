//! Infrastructure layer for the upgrade command.
//!
//! Contains the OS-facing adapters: file storage and settings, probe
//! implementations, external command hooks, console rendering, and the
//! composition root that wires them into the application layer.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `envup_core`, but MUST NOT be imported by the `application` layer or the
//! core crate.

pub mod commands;
pub mod console;
pub mod probes;
pub mod storage;
pub mod wiring;
