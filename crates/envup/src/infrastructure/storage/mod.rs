//! Storage infrastructure: everything that touches the file system.
//!
//! - `settings`: envup's own TOML settings and path resolution.
//! - `env_file`: reading the live `.env` and the template.
//! - `lock`: the advisory lock held while the live file is replaced.
//! - `writer`: backup, template baseline and atomic replace.
//! - `env_store`: the [`ConfigurationStore`](crate::application::update_configuration::ConfigurationStore)
//!   implementation that ties the above together.

pub mod env_file;
pub mod env_store;
pub mod lock;
pub mod settings;
pub mod writer;
