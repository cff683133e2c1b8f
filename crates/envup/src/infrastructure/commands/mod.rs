//! External application commands.
//!
//! - `runner`: spawns one command with a timeout and captures its output.
//! - `hooks`: maps the maintenance, migration, optimization, queue and
//!   deployment-count collaborators onto configured commands.

pub mod hooks;
pub mod runner;
