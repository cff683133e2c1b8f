//! Probe adapters for the upgrade gate.
//!
//! - `installation`: decides whether the application has a real encryption
//!   key, read from the process environment or from the live `.env`.
//! - `dependencies`: reads the modification time of the dependency-install
//!   artifact.
//!
//! The deployment probe runs an external command and lives in
//! [`commands`](super::commands).

pub mod dependencies;
pub mod installation;
