// src/config/loader.rs

use std::path::Path;

use anyhow::anyhow;
use tracing::debug;

use crate::config::model::{PipelineDef, RawPipelineDef};
use crate::errors::{CascadeError, Result};
use crate::fs::FileSystem;
use crate::types::DocumentFormat;

/// Load a pipeline document from a given path and return the raw
/// [`RawPipelineDef`].
///
/// This only performs deserialization (YAML, or TOML for `.toml` files); it
/// does **not** perform semantic validation. Use [`load_and_validate`] for
/// that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawPipelineDef> {
    let path = path.as_ref();
    if !fs.is_file(path) {
        return Err(CascadeError::Other(anyhow!(
            "pipeline file {:?} does not exist or is not a file",
            path
        )));
    }

    let contents = fs.read_to_string(path)?;
    let format = DocumentFormat::from_extension(path.extension().and_then(|e| e.to_str()));
    debug!(path = %path.display(), ?format, "parsing pipeline document");

    parse_str(&contents, format)
}

/// Decode a pipeline document held in memory.
pub fn parse_str(contents: &str, format: DocumentFormat) -> Result<RawPipelineDef> {
    let raw = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
        DocumentFormat::Toml => toml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a pipeline document from path and validate its declarations.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads the document through the given filesystem handle.
/// - Applies defaults (handled by `serde`).
/// - Checks for missing required entries, self dependencies and undefined
///   dependencies, reporting all of them at once.
///
/// Structural properties (connectivity, cycles) are checked later on the
/// compiled graph.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<PipelineDef> {
    let raw = load_from_path(fs, path)?;
    PipelineDef::try_from(raw)
}
