// src/dag/plan.rs

//! Static execution plan used by `--dry-run`.

use crate::dag::graph::{CompiledGraph, StepId};

/// Group steps into waves: every step of wave `n` only depends on steps of
/// earlier waves, so with unbounded parallelism and instant steps the
/// scheduler would start each wave together.
///
/// Kahn's algorithm, level by level. Steps on a cycle never reach zero
/// in-degree and are left out; run the property checker first.
pub fn execution_waves(graph: &CompiledGraph) -> Vec<Vec<StepId>> {
    let mut in_degree: Vec<usize> = graph
        .steps()
        .iter()
        .map(|s| s.predecessors.len())
        .collect();

    let mut current: Vec<StepId> = graph
        .steps()
        .iter()
        .filter(|s| s.predecessors.is_empty())
        .map(|s| s.id)
        .collect();

    let mut waves = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &id in &current {
            for &succ in graph.successors_of(id) {
                let degree = &mut in_degree[succ.0];
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    next.push(succ);
                }
            }
        }
        next.sort_unstable();
        next.dedup();
        waves.push(std::mem::replace(&mut current, next));
    }

    waves
}
