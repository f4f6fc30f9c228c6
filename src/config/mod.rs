// src/config/mod.rs

//! Pipeline document loading and declaration validation.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a pipeline document through a [`crate::fs::FileSystem`] (`loader.rs`).
//! - Validate step declarations and aggregate every violation (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{PipelineDef, RawPipelineDef, StepDeclaration};
pub use validate::{validate_declarations, DeclarationIssue, DeclarationReport};
