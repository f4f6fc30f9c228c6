// src/dag/state_manager.rs

//! Live per-run state: step states, outstanding predecessor counts and the
//! ready queue.
//!
//! Owned exclusively by the [`crate::dag::Scheduler`]; nothing here is
//! shared across tasks.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::dag::graph::{CompiledGraph, StepId};
use crate::dag::step_info::StepRunState;

#[derive(Debug, Clone)]
pub struct RunTable {
    states: Vec<StepRunState>,
    /// Predecessors of each step that have not succeeded yet.
    outstanding: Vec<usize>,
    /// Steps whose predecessors all succeeded but that were not dispatched
    /// yet, in the order they became ready.
    ready: VecDeque<StepId>,
    running: usize,
}

impl RunTable {
    /// Fresh table: everything pending, roots queued as ready.
    pub fn new(graph: &CompiledGraph) -> Self {
        let states = vec![StepRunState::Pending; graph.len()];
        let outstanding: Vec<usize> = graph
            .steps()
            .iter()
            .map(|s| s.predecessors.len())
            .collect();
        let ready = graph
            .steps()
            .iter()
            .filter(|s| s.predecessors.is_empty())
            .map(|s| s.id)
            .collect();

        Self {
            states,
            outstanding,
            ready,
            running: 0,
        }
    }

    pub fn state(&self, id: StepId) -> Option<StepRunState> {
        self.states.get(id.0).copied()
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn outstanding_of(&self, id: StepId) -> Option<usize> {
        self.outstanding.get(id.0).copied()
    }

    /// Pop ready steps and mark them `Running`, respecting an optional cap
    /// on concurrently running steps.
    ///
    /// A step leaves the ready queue the moment it is taken, so it can never
    /// be dispatched twice.
    pub fn take_ready(&mut self, max_parallel: Option<NonZeroUsize>) -> Vec<StepId> {
        let mut taken = Vec::new();

        while let Some(&id) = self.ready.front() {
            if let Some(cap) = max_parallel {
                if self.running >= cap.get() {
                    break;
                }
            }
            self.ready.pop_front();

            if self.states[id.0] != StepRunState::Pending {
                warn!(step = %id, state = ?self.states[id.0], "ready step is no longer pending; not dispatching");
                continue;
            }

            self.states[id.0] = StepRunState::Running;
            self.running += 1;
            taken.push(id);
        }

        taken
    }

    /// Record the terminal state of a running step.
    ///
    /// Returns `false` (and changes nothing) if the step was not running.
    pub fn finish(&mut self, id: StepId, state: StepRunState) -> bool {
        match self.states.get(id.0) {
            Some(StepRunState::Running) => {
                self.states[id.0] = state;
                self.running -= 1;
                true
            }
            _ => false,
        }
    }

    /// A step succeeded: consume its edge on every successor and queue the
    /// successors that have nothing left to wait for.
    ///
    /// Returns the steps that just became ready, sorted by id.
    pub fn release_successors(&mut self, graph: &CompiledGraph, id: StepId) -> Vec<StepId> {
        let mut newly_ready = Vec::new();

        for &succ in graph.successors_of(id) {
            if self.states.get(succ.0) != Some(&StepRunState::Pending) {
                continue;
            }
            let count = &mut self.outstanding[succ.0];
            *count = count.saturating_sub(1);
            if *count == 0 {
                newly_ready.push(succ);
            }
        }

        newly_ready.sort_unstable();
        self.ready.extend(newly_ready.iter().copied());
        newly_ready
    }

    /// Mark every pending transitive successor of `id` as `Skipped`.
    pub fn skip_dependents(&mut self, graph: &CompiledGraph, id: StepId) -> Vec<StepId> {
        let mut stack: Vec<StepId> = graph.successors_of(id).to_vec();
        let mut skipped = Vec::new();

        while let Some(next) = stack.pop() {
            if self.states.get(next.0) == Some(&StepRunState::Pending) {
                self.states[next.0] = StepRunState::Skipped;
                debug!(step = %graph.name_of(next), "skipping step due to upstream failure");
                skipped.push(next);
                stack.extend(graph.successors_of(next).iter().copied());
            }
        }

        self.ready.retain(|r| !skipped.contains(r));
        skipped.sort_unstable();
        skipped
    }

    /// Mark every pending step as `Skipped` and clear the ready queue.
    pub fn skip_all_pending(&mut self) -> Vec<StepId> {
        let mut skipped = Vec::new();
        for (i, state) in self.states.iter_mut().enumerate() {
            if *state == StepRunState::Pending {
                *state = StepRunState::Skipped;
                skipped.push(StepId(i));
            }
        }
        self.ready.clear();
        skipped
    }

    /// Check if all steps are in a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.states.iter().all(|s| s.is_terminal())
    }

    pub fn any_in(&self, state: StepRunState) -> bool {
        self.states.contains(&state)
    }
}
