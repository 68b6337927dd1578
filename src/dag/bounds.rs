// src/dag/bounds.rs

//! Earliest (ASAP) and latest (ALAP) feasible cycle per operation.
//!
//! Both are 0-based cycle indices. ALAP depends on a latency bound, which in
//! practice is the heuristic schedule's cycle count.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::dag::graph::{OpId, OperationGraph};
use crate::errors::{Result, SchedError};

/// Scheduling window of every operation, indexed by `OpId::index()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds {
    pub asap: Vec<usize>,
    pub alap: Vec<usize>,
    pub upper_bound: usize,
}

impl Bounds {
    /// Compute ASAP and ALAP for a latency bound of `upper_bound` cycles.
    pub fn compute(graph: &OperationGraph, upper_bound: usize) -> Result<Self> {
        let order = graph.topological_order()?;
        let asap = asap_in_order(graph, &order);
        let alap = alap_in_order(graph, &order, upper_bound)?;

        if let Some(&id) = order.iter().find(|id| alap[id.index()] < asap[id.index()]) {
            return Err(SchedError::UpperBoundTooSmall {
                upper_bound,
                operation: graph.name(id).to_string(),
            });
        }

        debug!(
            operations = graph.len(),
            upper_bound,
            window_slots = asap
                .iter()
                .zip(alap.iter())
                .map(|(lo, hi)| hi - lo + 1)
                .sum::<usize>(),
            "computed ASAP/ALAP bounds"
        );

        Ok(Self {
            asap,
            alap,
            upper_bound,
        })
    }

    /// Candidate cycles for an operation.
    pub fn window(&self, id: OpId) -> RangeInclusive<usize> {
        self.asap[id.index()]..=self.alap[id.index()]
    }

    /// Number of cycles on the longest dependency chain.
    pub fn min_latency(&self) -> usize {
        self.asap.iter().map(|t| t + 1).max().unwrap_or(0)
    }
}

/// Forward longest-path pass: operations without predecessors start at
/// cycle 0, every other one right after its latest predecessor.
pub fn asap(graph: &OperationGraph) -> Result<Vec<usize>> {
    let order = graph.topological_order()?;
    Ok(asap_in_order(graph, &order))
}

/// Backward pass: sinks and primary outputs start at `upper_bound - 1`, and
/// every producer is pulled to at most one cycle before its earliest
/// consumer. A primary output that also feeds other gates is pulled like
/// any other producer.
///
/// Fails if the bound is too small for some dependency chain.
pub fn alap(graph: &OperationGraph, upper_bound: usize) -> Result<Vec<usize>> {
    let order = graph.topological_order()?;
    alap_in_order(graph, &order, upper_bound)
}

fn asap_in_order(graph: &OperationGraph, order: &[OpId]) -> Vec<usize> {
    let mut asap = vec![0usize; graph.len()];
    for &id in order {
        let start = asap[id.index()];
        for succ in graph.successors(id) {
            let slot = &mut asap[succ.index()];
            *slot = (*slot).max(start + 1);
        }
    }
    asap
}

fn alap_in_order(
    graph: &OperationGraph,
    order: &[OpId],
    upper_bound: usize,
) -> Result<Vec<usize>> {
    let too_small = |id: OpId| SchedError::UpperBoundTooSmall {
        upper_bound,
        operation: graph.name(id).to_string(),
    };

    let last = match upper_bound.checked_sub(1) {
        Some(last) => last,
        None => match order.first() {
            Some(&id) => return Err(too_small(id)),
            None => return Ok(Vec::new()),
        },
    };

    // Every operation starts at the last cycle; sinks stay there and the rest
    // are pulled earlier by their consumers. Reverse topological order means
    // each consumer is final before its producers are visited.
    let mut alap = vec![last; graph.len()];

    for &id in order.iter().rev() {
        let mut latest = last;
        for succ in graph.successors(id) {
            let bound = alap[succ.index()]
                .checked_sub(1)
                .ok_or_else(|| too_small(id))?;
            latest = latest.min(bound);
        }
        alap[id.index()] = latest;
    }

    Ok(alap)
}
