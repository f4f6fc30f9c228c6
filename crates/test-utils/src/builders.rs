#![allow(dead_code)]

use std::collections::HashMap;

use cascade::config::{PipelineDef, RawPipelineDef, StepDeclaration};
use cascade::dag::CompiledGraph;

/// Builder for pipeline definitions to simplify test setup.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: HashMap<String, StepDeclaration>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, name: &str, step: StepDeclaration) -> Self {
        self.steps.insert(name.to_string(), step);
        self
    }

    /// Unvalidated definition, for exercising the validator.
    pub fn raw(self) -> RawPipelineDef {
        RawPipelineDef::new(self.steps)
    }

    pub fn build(self) -> PipelineDef {
        PipelineDef::try_from(self.raw()).expect("Failed to build valid pipeline from builder")
    }

    pub fn compile(self) -> CompiledGraph {
        CompiledGraph::compile(&self.build())
    }
}

/// Builder for `StepDeclaration`.
///
/// `source_repo` defaults to `"repo"` so that only the command is required.
#[derive(Debug)]
pub struct StepBuilder {
    step: StepDeclaration,
}

impl StepBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            step: StepDeclaration {
                source_repo: "repo".to_string(),
                source_path: String::new(),
                command: command.to_string(),
                dependencies: vec![],
                paths: vec![],
            },
        }
    }

    pub fn source_repo(mut self, repo: &str) -> Self {
        self.step.source_repo = repo.to_string();
        self
    }

    pub fn source_path(mut self, path: &str) -> Self {
        self.step.source_path = path.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.step.dependencies.push(dep.to_string());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.step.paths.push(path.to_string());
        self
    }

    pub fn build(self) -> StepDeclaration {
        self.step
    }
}

/// Compile a graph from `(name, dependencies)` pairs. Commands are
/// `echo <name>`.
pub fn graph_from_edges(steps: &[(&str, &[&str])]) -> CompiledGraph {
    let mut builder = PipelineBuilder::new();
    for (name, deps) in steps {
        let mut step = StepBuilder::new(&format!("echo {name}"));
        for dep in deps.iter() {
            step = step.after(dep);
        }
        builder = builder.with_step(name, step.build());
    }
    builder.compile()
}

/// A -> {B, C} -> D
pub fn diamond() -> CompiledGraph {
    graph_from_edges(&[("A", &[]), ("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])])
}
