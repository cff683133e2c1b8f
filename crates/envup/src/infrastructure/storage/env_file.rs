//! Reading environment files from disk.
//!
//! Thin wrappers that read a file and hand its contents to the `envup-core`
//! parsers.  The operator's file must exist; a missing file is reported as an
//! error here rather than treated as empty, because upgrading a missing `.env`
//! would silently replace it with template defaults.

use std::io;
use std::path::{Path, PathBuf};

use envup_core::{
    parse_config, read_template as read_template_text, ParsedConfig, Template, TemplateError,
};
use thiserror::Error;

/// Error type for environment file reads.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template {path} is invalid: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}

/// Reads and parses the operator's environment file.
///
/// # Errors
///
/// Returns [`EnvFileError::Read`] if the file cannot be read.
pub fn parse(path: &Path) -> Result<ParsedConfig, EnvFileError> {
    let contents = read(path)?;
    Ok(parse_config(&contents))
}

/// Reads and parses the template file.
///
/// # Errors
///
/// Returns [`EnvFileError::Read`] if the file cannot be read, or
/// [`EnvFileError::Template`] if a line is malformed.
pub fn read_template(path: &Path) -> Result<Template, EnvFileError> {
    let contents = read(path)?;
    read_template_text(&contents).map_err(|source| EnvFileError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, EnvFileError> {
    std::fs::read_to_string(path).map_err(|source| EnvFileError::Read {
        path: path.to_path_buf(),
        source,
    })
}
