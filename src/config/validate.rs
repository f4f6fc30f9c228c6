// src/config/validate.rs

use std::fmt;

use tracing::debug;

use crate::config::model::{PipelineDef, RawPipelineDef, StepDeclaration};
use crate::errors::CascadeError;

impl TryFrom<RawPipelineDef> for PipelineDef {
    type Error = CascadeError;

    fn try_from(raw: RawPipelineDef) -> std::result::Result<Self, Self::Error> {
        validate_declarations(&raw)?;
        Ok(PipelineDef::new_unchecked(raw.steps))
    }
}

/// A single problem found in the step declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationIssue {
    /// The document declares no step at all.
    EmptyPipeline,
    /// Required fields are absent or empty.
    MissingEntries {
        step: String,
        entries: Vec<&'static str>,
    },
    /// The step lists itself in `dependencies`.
    SelfDependency { step: String },
    /// The step lists a dependency that is not a key of the pipeline.
    UndefinedDependency { step: String, dependency: String },
}

impl fmt::Display for DeclarationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPipeline => write!(f, "pipeline must declare at least one step"),
            Self::MissingEntries { step, entries } => {
                write!(f, "{step}: missing entries: [{}]", entries.join(", "))
            }
            Self::SelfDependency { step } => write!(f, "{step}: has dependency on itself"),
            Self::UndefinedDependency { step, dependency } => {
                write!(f, "{step}: declared dependency {dependency} is not defined")
            }
        }
    }
}

/// Every violation found in a pipeline definition, in step-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationReport {
    issues: Vec<DeclarationIssue>,
}

impl DeclarationReport {
    pub fn issues(&self) -> &[DeclarationIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues reported against the given step.
    pub fn issues_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a DeclarationIssue> {
        self.issues.iter().filter(move |issue| match issue {
            DeclarationIssue::EmptyPipeline => false,
            DeclarationIssue::MissingEntries { step: s, .. }
            | DeclarationIssue::SelfDependency { step: s }
            | DeclarationIssue::UndefinedDependency { step: s, .. } => s == step,
        })
    }
}

impl fmt::Display for DeclarationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "errors in pipeline definition:")?;
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeclarationReport {}

/// Check every declaration and collect all violations.
///
/// Nothing short-circuits: a step with missing fields is still checked for
/// self and undefined dependencies, and every step is visited.
pub fn validate_declarations(raw: &RawPipelineDef) -> std::result::Result<(), DeclarationReport> {
    let mut report = DeclarationReport::default();

    if raw.steps.is_empty() {
        report.issues.push(DeclarationIssue::EmptyPipeline);
    }

    let mut names: Vec<&String> = raw.steps.keys().collect();
    names.sort();

    for name in names {
        let step = &raw.steps[name];
        check_step(raw, name, step, &mut report.issues);
    }

    if report.is_empty() {
        debug!(steps = raw.steps.len(), "pipeline declarations are valid");
        Ok(())
    } else {
        debug!(issues = report.issues.len(), "pipeline declarations rejected");
        Err(report)
    }
}

fn check_step(
    raw: &RawPipelineDef,
    name: &str,
    step: &StepDeclaration,
    issues: &mut Vec<DeclarationIssue>,
) {
    let missing = missing_entries(step);
    if !missing.is_empty() {
        issues.push(DeclarationIssue::MissingEntries {
            step: name.to_string(),
            entries: missing,
        });
    }

    if step.dependencies.iter().any(|dep| dep == name) {
        issues.push(DeclarationIssue::SelfDependency {
            step: name.to_string(),
        });
    }

    for dep in &step.dependencies {
        if !raw.steps.contains_key(dep) {
            issues.push(DeclarationIssue::UndefinedDependency {
                step: name.to_string(),
                dependency: dep.clone(),
            });
        }
    }
}

fn missing_entries(step: &StepDeclaration) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if step.source_repo.trim().is_empty() {
        missing.push("source_repo");
    }
    if step.command.trim().is_empty() {
        missing.push("command");
    }
    missing
}
