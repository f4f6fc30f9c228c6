// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::config::model::PipelineDef;

/// Stable identity of a step inside a [`CompiledGraph`].
///
/// Ids are positions in the lexicographic order of step names, so the same
/// pipeline definition always yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(pub usize);

impl StepId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolved, immutable description of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStep {
    pub id: StepId,
    pub name: String,
    pub source_repo: String,
    pub source_path: String,
    pub command: String,
    pub paths: Vec<String>,
    /// Steps that must complete before this one (sorted, no duplicates).
    pub predecessors: Vec<StepId>,
    /// Steps that declare this one as a dependency (sorted, no duplicates).
    pub successors: Vec<StepId>,
}

/// Compiled pipeline: every step plus its resolved adjacency.
///
/// Shared read-only after compilation; the scheduler keeps its own live
/// counters and never mutates the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGraph {
    steps: Vec<CompiledStep>,
    index: HashMap<String, StepId>,
}

impl CompiledGraph {
    /// Compile a validated [`PipelineDef`].
    ///
    /// Assumes that every dependency names an existing step, which
    /// `PipelineDef` guarantees.
    pub fn compile(def: &PipelineDef) -> Self {
        let names = def.sorted_names();
        let index: HashMap<String, StepId> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), StepId(i)))
            .collect();

        let mut steps = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let Some(decl) = def.get(name) else {
                continue;
            };

            steps.push(CompiledStep {
                id: StepId(i),
                name: name.to_string(),
                source_repo: decl.source_repo.clone(),
                source_path: decl.source_path.clone(),
                command: decl.command.clone(),
                paths: decl.paths.clone(),
                predecessors: predecessors_of(def, name, &index),
                successors: successors_of(def, name, &index),
            });
        }

        Self { steps, index }
    }

    /// Build a graph from already-resolved steps.
    ///
    /// Step `i` must carry `StepId(i)`; predecessor and successor lists are
    /// taken as given (sorted and deduplicated here). Useful for exercising
    /// the property checker on shapes the declaration validator would
    /// reject.
    pub fn from_steps(mut steps: Vec<CompiledStep>) -> Self {
        let mut index = HashMap::with_capacity(steps.len());
        for (i, step) in steps.iter_mut().enumerate() {
            step.id = StepId(i);
            normalize(&mut step.predecessors);
            normalize(&mut step.successors);
            index.insert(step.name.clone(), step.id);
        }
        Self { steps, index }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps, ordered by id.
    pub fn steps(&self) -> &[CompiledStep] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&CompiledStep> {
        self.steps.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<StepId> {
        self.index.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&CompiledStep> {
        self.id_of(name).and_then(|id| self.step(id))
    }

    pub fn name_of(&self, id: StepId) -> &str {
        self.step(id).map(|s| s.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn predecessors_of(&self, id: StepId) -> &[StepId] {
        self.step(id).map(|s| s.predecessors.as_slice()).unwrap_or(&[])
    }

    pub fn successors_of(&self, id: StepId) -> &[StepId] {
        self.step(id).map(|s| s.successors.as_slice()).unwrap_or(&[])
    }

    /// Names for a list of ids, in the same order.
    pub fn names_of(&self, ids: &[StepId]) -> Vec<String> {
        ids.iter().map(|id| self.name_of(*id).to_string()).collect()
    }

    /// Petgraph view of the successor relation.
    ///
    /// Node `i` corresponds to `StepId(i)`; edge `a -> b` means `b` depends
    /// on `a`.
    pub fn to_petgraph(&self) -> DiGraph<StepId, ()> {
        let mut graph = DiGraph::with_capacity(self.steps.len(), 0);
        for step in &self.steps {
            graph.add_node(step.id);
        }
        for step in &self.steps {
            for succ in &step.successors {
                if succ.0 < self.steps.len() {
                    graph.add_edge(NodeIndex::new(step.id.0), NodeIndex::new(succ.0), ());
                }
            }
        }
        graph
    }
}

fn predecessors_of(def: &PipelineDef, name: &str, index: &HashMap<String, StepId>) -> Vec<StepId> {
    let mut preds: Vec<StepId> = def
        .get(name)
        .map(|decl| {
            decl.dependencies
                .iter()
                .filter_map(|dep| index.get(dep).copied())
                .collect()
        })
        .unwrap_or_default();
    normalize(&mut preds);
    preds
}

fn successors_of(def: &PipelineDef, name: &str, index: &HashMap<String, StepId>) -> Vec<StepId> {
    let mut succs: Vec<StepId> = def
        .steps()
        .filter(|(_, decl)| decl.dependencies.iter().any(|dep| dep == name))
        .filter_map(|(other, _)| index.get(other).copied())
        .collect();
    normalize(&mut succs);
    succs
}

fn normalize(ids: &mut Vec<StepId>) {
    ids.sort_unstable();
    ids.dedup();
}
