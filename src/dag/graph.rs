// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::errors::{Result, SchedError};
use crate::netlist::{GateKind, Netlist, Operation};

/// Handle of an operation inside an [`OperationGraph`].
///
/// `id.index()` is dense in `0..graph.len()`, so per-operation data can live
/// in plain vectors.
pub type OpId = NodeIndex;

/// Precedence graph over operations, keyed by output signal name.
///
/// Edge direction: producer -> consumer. Operands that name a primary input
/// (or nothing at all) contribute no edge, and repeated operands produce a
/// single edge.
#[derive(Debug, Clone)]
pub struct OperationGraph {
    graph: DiGraph<Operation, ()>,
    index: HashMap<String, OpId>,
    primary_outputs: HashSet<String>,
}

impl OperationGraph {
    /// Build the graph from a parsed [`Netlist`].
    pub fn from_netlist(netlist: &Netlist) -> Result<Self> {
        Self::build(&netlist.operations, &netlist.inputs, &netlist.outputs)
    }

    /// Build the graph from a flat operation list.
    ///
    /// Rejects duplicate outputs and malformed operations. Cycles are not
    /// checked here; [`OperationGraph::topological_order`] and the
    /// critical-path pass report them.
    pub fn build(
        operations: &[Operation],
        primary_inputs: &[String],
        primary_outputs: &[String],
    ) -> Result<Self> {
        let mut graph: DiGraph<Operation, ()> = DiGraph::with_capacity(operations.len(), 0);
        let mut index: HashMap<String, OpId> = HashMap::with_capacity(operations.len());

        // First pass: one node per operation.
        for op in operations {
            validate_operation(op)?;
            if index.contains_key(&op.output) {
                return Err(SchedError::DuplicateOutput(op.output.clone()));
            }
            let id = graph.add_node(op.clone());
            index.insert(op.output.clone(), id);
        }

        // Second pass: producer -> consumer edges.
        let inputs: HashSet<&str> = primary_inputs.iter().map(String::as_str).collect();
        let mut edges = 0usize;
        for consumer in graph.node_indices().collect::<Vec<_>>() {
            let operands = graph[consumer].inputs.clone();
            for operand in operands {
                match index.get(&operand) {
                    Some(&producer) => {
                        if graph.find_edge(producer, consumer).is_none() {
                            graph.add_edge(producer, consumer, ());
                            edges += 1;
                        }
                    }
                    None if inputs.contains(operand.as_str()) => {}
                    None => {
                        warn!(
                            operation = %graph[consumer].output,
                            signal = %operand,
                            "operand is neither a primary input nor a gate output; treating as primary input"
                        );
                    }
                }
            }
        }

        debug!(
            operations = graph.node_count(),
            edges,
            primary_inputs = primary_inputs.len(),
            primary_outputs = primary_outputs.len(),
            "built operation graph"
        );

        Ok(Self {
            graph,
            index,
            primary_outputs: primary_outputs.iter().cloned().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All operation ids, in input order.
    pub fn ids(&self) -> impl Iterator<Item = OpId> + '_ {
        self.graph.node_indices()
    }

    pub fn operation(&self, id: OpId) -> &Operation {
        &self.graph[id]
    }

    pub fn name(&self, id: OpId) -> &str {
        &self.graph[id].output
    }

    pub fn kind(&self, id: OpId) -> GateKind {
        self.graph[id].kind
    }

    pub fn index_of(&self, name: &str) -> Option<OpId> {
        self.index.get(name).copied()
    }

    /// Operations whose output feeds `id`.
    pub fn predecessors(&self, id: OpId) -> impl Iterator<Item = OpId> + '_ {
        self.graph.neighbors_directed(id, Incoming)
    }

    /// Operations consuming the output of `id`.
    pub fn successors(&self, id: OpId) -> impl Iterator<Item = OpId> + '_ {
        self.graph.neighbors_directed(id, Outgoing)
    }

    pub fn is_primary_output(&self, id: OpId) -> bool {
        self.primary_outputs.contains(self.name(id))
    }

    /// No operation consumes this one's output.
    pub fn is_sink(&self, id: OpId) -> bool {
        self.successors(id).next().is_none()
    }

    /// Number of operations of the given kind.
    pub fn count(&self, kind: GateKind) -> usize {
        self.ids().filter(|&id| self.kind(id) == kind).count()
    }

    /// Kahn's algorithm over the precedence edges.
    ///
    /// Operations with no predecessors are seeded in input order, so the
    /// result is deterministic.
    pub fn topological_order(&self) -> Result<Vec<OpId>> {
        let mut in_degree: Vec<usize> = self
            .ids()
            .map(|id| self.predecessors(id).count())
            .collect();

        let mut queue: VecDeque<OpId> = self
            .ids()
            .filter(|id| in_degree[id.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for succ in self.successors(id) {
                let degree = &mut in_degree[succ.index()];
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(succ);
                }
            }
        }

        if order.len() != self.len() {
            let stuck = self
                .ids()
                .find(|id| in_degree[id.index()] > 0)
                .map(|id| self.name(id).to_string())
                .unwrap_or_default();
            return Err(SchedError::DependencyCycle(stuck));
        }

        Ok(order)
    }
}

fn validate_operation(op: &Operation) -> Result<()> {
    let malformed = |reason: &str| SchedError::MalformedOperation {
        output: op.output.clone(),
        reason: reason.to_string(),
    };

    if op.output.trim().is_empty() {
        return Err(malformed("empty output signal name"));
    }
    match op.kind {
        GateKind::Not if op.inputs.len() != 1 => {
            return Err(malformed("NOT gates take exactly one input"));
        }
        GateKind::And | GateKind::Or if op.inputs.is_empty() => {
            return Err(malformed("gate has no inputs"));
        }
        _ => {}
    }
    if op.inputs.iter().any(|i| i == &op.output) {
        return Err(malformed("gate consumes its own output"));
    }
    Ok(())
}
