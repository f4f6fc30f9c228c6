// src/config/model.rs

use std::collections::HashMap;

use serde::Deserialize;

/// One step as declared in a pipeline document.
///
/// ```yaml
/// build:
///   source_repo: app
///   source_path: services/api
///   command: make build
///   paths: [src]
///
/// test:
///   source_repo: app
///   command: make test
///   dependencies: [build]
/// ```
///
/// Every field defaults to empty at decode time so that missing required
/// entries are reported together by the validator instead of aborting the
/// parse on the first one. Unknown fields are still a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDeclaration {
    /// Repository the step's command belongs to. Required.
    #[serde(default)]
    pub source_repo: String,

    /// Location inside `source_repo`. Optional; passed through untouched.
    #[serde(default)]
    pub source_path: String,

    /// Command line to execute. Required.
    #[serde(default)]
    pub command: String,

    /// Names of steps that must complete before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Paths affected by this step.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Pipeline document as decoded, before any semantic checks.
///
/// Keys are the *step names*. The mapping is unordered; everything derived
/// from it sorts names first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawPipelineDef {
    pub steps: HashMap<String, StepDeclaration>,
}

impl RawPipelineDef {
    pub fn new(steps: HashMap<String, StepDeclaration>) -> Self {
        Self { steps }
    }
}

/// A pipeline definition that passed [`crate::config::validate`].
///
/// Only obtainable via `PipelineDef::try_from(raw)`, so holding one means
/// every dependency names an existing step and no step depends on itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDef {
    steps: HashMap<String, StepDeclaration>,
}

impl PipelineDef {
    pub(crate) fn new_unchecked(steps: HashMap<String, StepDeclaration>) -> Self {
        Self { steps }
    }

    pub fn get(&self, name: &str) -> Option<&StepDeclaration> {
        self.steps.get(name)
    }

    pub fn steps(&self) -> impl Iterator<Item = (&str, &StepDeclaration)> {
        self.steps.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Step names in lexicographic order.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
