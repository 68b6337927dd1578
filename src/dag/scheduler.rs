// src/dag/scheduler.rs

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use tracing::{debug, info};

use crate::dag::critical_path::critical_path_lengths;
use crate::dag::graph::{OpId, OperationGraph};
use crate::errors::{Result, SchedError};
use crate::netlist::GateKind;
use crate::schedule::{Cycle, ResourceLimits, Schedule};

/// Per-run state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpState {
    /// Some producer has not been scheduled in an earlier cycle yet.
    Waiting,
    /// All producers finished in earlier cycles; competing for a slot.
    Ready,
    /// Placed in a cycle.
    Scheduled,
}

/// Heap entry for a ready operation.
///
/// Field order gives the ranking: longer critical path first, then the
/// alphabetically smaller name.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ReadyOp<'g> {
    priority: usize,
    name: Reverse<&'g str>,
    id: OpId,
}

/// Resource-constrained list scheduler.
///
/// Builds the schedule one cycle at a time. In each cycle, and for each gate
/// type independently, ready operations are admitted in priority order until
/// the type's capacity is reached. Operations finishing in a cycle only
/// unblock their consumers from the next cycle on.
pub struct ListScheduler<'g> {
    graph: &'g OperationGraph,
    limits: ResourceLimits,
    priorities: Vec<usize>,
    states: Vec<OpState>,
    /// Producers of each operation not yet scheduled.
    unscheduled_preds: Vec<usize>,
    ready: BTreeMap<GateKind, BinaryHeap<ReadyOp<'g>>>,
}

impl<'g> ListScheduler<'g> {
    /// Prepare a run: check capacities and compute the critical-path
    /// priorities for every operation.
    pub fn new(graph: &'g OperationGraph, limits: &ResourceLimits) -> Result<Self> {
        check_capacity(graph, limits)?;
        let priorities = critical_path_lengths(graph)?;

        let unscheduled_preds: Vec<usize> = graph
            .ids()
            .map(|id| graph.predecessors(id).count())
            .collect();

        let mut scheduler = Self {
            graph,
            limits: limits.clone(),
            priorities,
            states: vec![OpState::Waiting; graph.len()],
            unscheduled_preds,
            ready: BTreeMap::new(),
        };

        for id in graph.ids() {
            if scheduler.unscheduled_preds[id.index()] == 0 {
                scheduler.mark_ready(id);
            }
        }

        Ok(scheduler)
    }

    /// Run to completion and return the schedule.
    pub fn run(mut self) -> Result<Schedule> {
        let mut cycles: Vec<Cycle> = Vec::new();
        let mut pending = self.graph.len();

        while pending > 0 {
            let t = cycles.len();
            let mut cycle = Cycle::new();
            let mut admitted: Vec<OpId> = Vec::new();

            for kind in GateKind::ALL {
                let capacity = self.limits.limit(kind);
                let heap = self.ready.entry(kind).or_default();

                while cycle.bucket(kind).len() < capacity {
                    let Some(op) = heap.pop() else {
                        break;
                    };
                    cycle.push(kind, op.name.0);
                    self.states[op.id.index()] = OpState::Scheduled;
                    admitted.push(op.id);
                }
            }

            if admitted.is_empty() {
                return Err(SchedError::Stalled {
                    cycle: t + 1,
                    pending,
                });
            }

            debug!(
                cycle = t + 1,
                and = cycle.bucket(GateKind::And).len(),
                or = cycle.bucket(GateKind::Or).len(),
                not = cycle.bucket(GateKind::Not).len(),
                "cycle filled"
            );

            pending -= admitted.len();
            cycles.push(cycle);

            // Consumers become ready for the next cycle, never this one.
            for id in admitted {
                self.release_consumers(id);
            }
        }

        info!(
            operations = self.graph.len(),
            latency = cycles.len(),
            "list scheduling finished"
        );

        Ok(Schedule::from_cycles(cycles))
    }

    fn mark_ready(&mut self, id: OpId) {
        let graph = self.graph;
        self.states[id.index()] = OpState::Ready;
        self.ready.entry(graph.kind(id)).or_default().push(ReadyOp {
            priority: self.priorities[id.index()],
            name: Reverse(graph.name(id)),
            id,
        });
    }

    fn release_consumers(&mut self, id: OpId) {
        let graph = self.graph;
        for succ in graph.successors(id) {
            let remaining = &mut self.unscheduled_preds[succ.index()];
            *remaining -= 1;
            if *remaining == 0 && self.states[succ.index()] == OpState::Waiting {
                self.mark_ready(succ);
            }
        }
    }
}

/// Schedule a graph with the list-scheduling heuristic.
pub fn list_schedule(graph: &OperationGraph, limits: &ResourceLimits) -> Result<Schedule> {
    ListScheduler::new(graph, limits)?.run()
}

/// A gate type with operations but no capacity can never be scheduled.
fn check_capacity(graph: &OperationGraph, limits: &ResourceLimits) -> Result<()> {
    for kind in GateKind::ALL {
        if limits.limit(kind) > 0 {
            continue;
        }
        let mut operations: Vec<String> = graph
            .ids()
            .filter(|&id| graph.kind(id) == kind)
            .map(|id| graph.name(id).to_string())
            .collect();
        if !operations.is_empty() {
            operations.sort();
            return Err(SchedError::Unschedulable { kind, operations });
        }
    }
    Ok(())
}
