// src/schedule.rs

//! Schedule output shape shared by the heuristic and optimizing paths.

use std::collections::{BTreeMap, HashMap};

use crate::dag::OperationGraph;
use crate::errors::{Result, SchedError};
use crate::netlist::GateKind;

/// Per-type capacity: how many operations of a kind may run in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    limits: BTreeMap<GateKind, usize>,
}

impl ResourceLimits {
    pub fn new(and: usize, or: usize, not: usize) -> Self {
        let limits = BTreeMap::from([
            (GateKind::And, and),
            (GateKind::Or, or),
            (GateKind::Not, not),
        ]);
        Self { limits }
    }

    /// Capacity for `kind`; kinds without an entry have capacity 0.
    pub fn limit(&self, kind: GateKind) -> usize {
        self.limits.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: GateKind, limit: usize) {
        self.limits.insert(kind, limit);
    }
}

/// Operations executing in one cycle, bucketed by gate type.
///
/// Every [`GateKind`] has a bucket, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    buckets: BTreeMap<GateKind, Vec<String>>,
}

impl Default for Cycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Cycle {
    pub fn new() -> Self {
        Self {
            buckets: GateKind::ALL.iter().map(|&k| (k, Vec::new())).collect(),
        }
    }

    pub fn bucket(&self, kind: GateKind) -> &[String] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, kind: GateKind, op: impl Into<String>) {
        self.buckets.entry(kind).or_default().push(op.into());
    }

    /// Buckets in [`GateKind`] order.
    pub fn buckets(&self) -> impl Iterator<Item = (GateKind, &[String])> {
        self.buckets.iter().map(|(&k, ops)| (k, ops.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    fn sort_buckets(&mut self) {
        for ops in self.buckets.values_mut() {
            ops.sort();
        }
    }
}

/// An ordered sequence of cycles. The number of cycles is the latency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    cycles: Vec<Cycle>,
}

impl Schedule {
    /// Build a schedule from cycles; each bucket is sorted alphabetically.
    pub fn from_cycles(mut cycles: Vec<Cycle>) -> Self {
        for cycle in cycles.iter_mut() {
            cycle.sort_buckets();
        }
        Self { cycles }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Total cycle count.
    pub fn latency(&self) -> usize {
        self.cycles.len()
    }

    pub fn operation_count(&self) -> usize {
        self.cycles.iter().map(Cycle::len).sum()
    }

    /// 0-based cycle index of an operation, if scheduled.
    pub fn cycle_of(&self, op: &str) -> Option<usize> {
        self.cycles
            .iter()
            .position(|c| c.buckets().any(|(_, ops)| ops.iter().any(|o| o == op)))
    }

    /// Map every scheduled operation to its 0-based cycle index.
    pub fn cycle_map(&self) -> HashMap<&str, usize> {
        let mut map = HashMap::new();
        for (t, cycle) in self.cycles.iter().enumerate() {
            for (_, ops) in cycle.buckets() {
                for op in ops {
                    map.insert(op.as_str(), t);
                }
            }
        }
        map
    }

    /// Verify the schedule against the graph and limits.
    ///
    /// Checks that every operation appears exactly once in the bucket of its
    /// own type, that every consumer runs strictly after its producers, and
    /// that no bucket exceeds its capacity.
    pub fn check(&self, graph: &OperationGraph, limits: &ResourceLimits) -> Result<()> {
        let mut placed: HashMap<&str, usize> = HashMap::new();

        for (t, cycle) in self.cycles.iter().enumerate() {
            for (kind, ops) in cycle.buckets() {
                if ops.len() > limits.limit(kind) {
                    return Err(SchedError::InvalidSchedule(format!(
                        "cycle {} runs {} {kind} operations, limit is {}",
                        t + 1,
                        ops.len(),
                        limits.limit(kind)
                    )));
                }

                for op in ops {
                    let Some(id) = graph.index_of(op) else {
                        return Err(SchedError::InvalidSchedule(format!(
                            "unknown operation '{op}' in cycle {}",
                            t + 1
                        )));
                    };
                    if graph.kind(id) != kind {
                        return Err(SchedError::InvalidSchedule(format!(
                            "'{op}' is {} but placed in the {kind} bucket",
                            graph.kind(id)
                        )));
                    }
                    if placed.insert(op.as_str(), t).is_some() {
                        return Err(SchedError::InvalidSchedule(format!(
                            "'{op}' is scheduled more than once"
                        )));
                    }
                }
            }
        }

        for id in graph.ids() {
            let name = graph.name(id);
            let Some(&t) = placed.get(name) else {
                return Err(SchedError::InvalidSchedule(format!(
                    "'{name}' is never scheduled"
                )));
            };
            for pred in graph.predecessors(id) {
                let pred_name = graph.name(pred);
                let pred_t = placed.get(pred_name).copied().unwrap_or(usize::MAX);
                if pred_t >= t {
                    return Err(SchedError::InvalidSchedule(format!(
                        "'{name}' in cycle {} does not follow its input '{pred_name}'",
                        t + 1
                    )));
                }
            }
        }

        Ok(())
    }
}
