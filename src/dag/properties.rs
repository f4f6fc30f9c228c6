// src/dag/properties.rs

//! Structural checks run on a [`CompiledGraph`] before anything executes.
//!
//! A pipeline is valid when it is a single weakly-connected component and
//! contains no cycle. The checker is read-only.

use std::collections::BTreeMap;

use petgraph::algo::connected_components;
use petgraph::unionfind::UnionFind;
use petgraph::visit::{depth_first_search, Control, DfsEvent};
use thiserror::Error;
use tracing::debug;

use crate::dag::graph::{CompiledGraph, StepId};

/// Why a compiled graph was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("pipeline has no steps")]
    Empty,

    #[error("pipeline is not connected; independent step groups: {}", format_groups(.components))]
    Disconnected { components: Vec<Vec<String>> },

    #[error("cycle detected in pipeline involving step '{step}'")]
    Cycle { step: String },
}

fn format_groups(components: &[Vec<String>]) -> String {
    components
        .iter()
        .map(|c| format!("[{}]", c.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which structural properties are enforced by [`check`].
///
/// Acyclicity is always required; connectivity can be relaxed to accept
/// pipelines made of several independent step groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphChecks {
    pub require_connected: bool,
}

impl Default for GraphChecks {
    fn default() -> Self {
        Self {
            require_connected: true,
        }
    }
}

/// `true` if the graph is exactly one weakly-connected component.
///
/// Edge direction is ignored. The empty graph has zero components and is
/// therefore not connected.
pub fn is_connected(graph: &CompiledGraph) -> bool {
    connected_components(&graph.to_petgraph()) == 1
}

/// Weakly-connected components of the graph.
///
/// Each component is sorted by id, and components are ordered by their
/// smallest member.
pub fn components(graph: &CompiledGraph) -> Vec<Vec<StepId>> {
    let n = graph.len();
    let mut sets: UnionFind<usize> = UnionFind::new(n);

    for step in graph.steps() {
        for succ in &step.successors {
            if succ.0 < n {
                sets.union(step.id.0, succ.0);
            }
        }
        for pred in &step.predecessors {
            if pred.0 < n {
                sets.union(step.id.0, pred.0);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<StepId>> = BTreeMap::new();
    for i in 0..n {
        groups.entry(sets.find(i)).or_default().push(StepId(i));
    }

    let mut out: Vec<Vec<StepId>> = groups.into_values().collect();
    out.sort_by_key(|c| c[0]);
    out
}

/// Find a step that lies on a cycle, if any.
///
/// Depth-first traversal with three-colour marking: reaching a node that is
/// still in progress (a back edge) means the node is its own ancestor.
pub fn find_cycle(graph: &CompiledGraph) -> Option<StepId> {
    let pg = graph.to_petgraph();

    depth_first_search(&pg, pg.node_indices(), |event| match event {
        DfsEvent::BackEdge(_, target) => Control::Break(pg[target]),
        _ => Control::Continue,
    })
    .break_value()
}

/// `true` if no step can reach itself by following successor edges.
pub fn is_acyclic(graph: &CompiledGraph) -> bool {
    find_cycle(graph).is_none()
}

/// Connected and acyclic.
pub fn is_valid(graph: &CompiledGraph) -> bool {
    is_connected(graph) && is_acyclic(graph)
}

/// Run the pre-execution gate.
///
/// Cycles are reported before connectivity problems since a cyclic graph
/// can never complete regardless of its shape.
pub fn check(graph: &CompiledGraph, checks: &GraphChecks) -> Result<(), StructuralError> {
    if graph.is_empty() {
        return Err(StructuralError::Empty);
    }

    if let Some(step) = find_cycle(graph) {
        return Err(StructuralError::Cycle {
            step: graph.name_of(step).to_string(),
        });
    }

    if checks.require_connected {
        let comps = components(graph);
        if comps.len() != 1 {
            return Err(StructuralError::Disconnected {
                components: comps.iter().map(|c| graph.names_of(c)).collect(),
            });
        }
    }

    debug!(
        steps = graph.len(),
        require_connected = checks.require_connected,
        "pipeline graph passed structural checks"
    );
    Ok(())
}
