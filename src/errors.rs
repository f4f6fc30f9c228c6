// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::config::validate::DeclarationReport;
use crate::dag::properties::StructuralError;

#[derive(Error, Debug)]
pub enum CascadeError {
    /// One or more step declarations are invalid. All violations are
    /// collected in the report.
    #[error("{0}")]
    Declaration(DeclarationReport),

    #[error("Invalid pipeline graph: {0}")]
    Structural(#[from] StructuralError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DeclarationReport> for CascadeError {
    fn from(report: DeclarationReport) -> Self {
        CascadeError::Declaration(report)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CascadeError>;
