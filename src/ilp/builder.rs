// src/ilp/builder.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::{Bounds, OpId, OperationGraph};
use crate::errors::{Result, SchedError};
use crate::ilp::model::{LinExpr, Model, Relation, Sense, Solution, VarId};
use crate::netlist::GateKind;
use crate::schedule::{Cycle, ResourceLimits, Schedule};

/// Smallest latency any schedule can reach: the longest dependency chain,
/// and for each gate type the cycles needed to run all of its operations at
/// full capacity.
pub fn latency_lower_bound(
    graph: &OperationGraph,
    bounds: &Bounds,
    limits: &ResourceLimits,
) -> usize {
    GateKind::ALL
        .iter()
        .filter_map(|&kind| match limits.limit(kind) {
            0 => None,
            limit => Some(graph.count(kind).div_ceil(limit)),
        })
        .fold(bounds.min_latency(), usize::max)
}

/// Time-indexed scheduling model.
///
/// One binary per (operation, cycle in its ASAP..=ALAP window), an integer
/// makespan variable, and the assignment, precedence, capacity and makespan
/// rows over them. The objective minimizes the makespan.
pub struct ScheduleModel<'g> {
    graph: &'g OperationGraph,
    model: Model,
    /// Candidate `(cycle, variable)` pairs per operation, by `OpId::index()`.
    candidates: Vec<Vec<(usize, VarId)>>,
    makespan: VarId,
    upper_bound: usize,
}

impl<'g> ScheduleModel<'g> {
    pub fn build(
        graph: &'g OperationGraph,
        bounds: &Bounds,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let upper_bound = bounds.upper_bound;
        let lower_bound = latency_lower_bound(graph, bounds, limits).min(upper_bound);

        let mut model = Model::new();
        let makespan = model.add_integer(lower_bound as i64, upper_bound as i64);

        let mut candidates: Vec<Vec<(usize, VarId)>> = vec![Vec::new(); graph.len()];
        for id in graph.topological_order()? {
            candidates[id.index()] = bounds
                .window(id)
                .map(|t| (t, model.add_binary()))
                .collect();
        }

        let time_of = |id: OpId| -> LinExpr {
            let mut expr = LinExpr::new();
            for &(t, var) in &candidates[id.index()] {
                expr.add_term(var, t as i64);
            }
            expr
        };

        for id in graph.ids() {
            let mut assigned = LinExpr::new();
            for &(_, var) in &candidates[id.index()] {
                assigned.add_term(var, 1);
            }
            model.add_constraint(assigned, Relation::Equal, 1);
        }

        for id in graph.ids() {
            let time = time_of(id);
            for pred in graph.predecessors(id) {
                let mut gap = time.clone();
                gap.add_scaled(&time_of(pred), -1);
                model.add_constraint(gap, Relation::GreaterEq, 1);
            }

            let mut after = LinExpr::from(makespan);
            after.add_scaled(&time, -1);
            model.add_constraint(after, Relation::GreaterEq, 1);
        }

        let mut slots: HashMap<(usize, GateKind), LinExpr> = HashMap::new();
        for id in graph.ids() {
            let kind = graph.kind(id);
            for &(t, var) in &candidates[id.index()] {
                slots.entry((t, kind)).or_default().add_term(var, 1);
            }
        }
        let mut capacity_rows = 0usize;
        for t in 0..upper_bound {
            for kind in GateKind::ALL {
                let Some(expr) = slots.remove(&(t, kind)) else {
                    continue;
                };
                let limit = limits.limit(kind);
                // Rows that can never bind are left out.
                if expr.terms().len() <= limit {
                    continue;
                }
                model.add_constraint(expr, Relation::LessEq, limit as i64);
                capacity_rows += 1;
            }
        }

        model.set_objective(LinExpr::from(makespan), Sense::Minimize);

        debug!(
            operations = graph.len(),
            variables = model.num_vars(),
            constraints = model.num_constraints(),
            capacity_rows,
            lower_bound,
            upper_bound,
            "built scheduling model"
        );

        Ok(Self {
            graph,
            model,
            candidates,
            makespan,
            upper_bound,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn makespan(&self) -> VarId {
        self.makespan
    }

    /// `(cycle, variable)` pairs for an operation.
    pub fn candidates(&self, id: OpId) -> &[(usize, VarId)] {
        &self.candidates[id.index()]
    }

    /// Suggest `schedule` as the starting point of the search.
    ///
    /// Fails if the schedule misses an operation or places one outside its
    /// window, which means it was not the schedule the bounds came from.
    pub fn warm_start(&mut self, schedule: &Schedule) -> Result<()> {
        let placed = schedule.cycle_map();

        for id in self.graph.ids() {
            let name = self.graph.name(id);
            let Some(&cycle) = placed.get(name) else {
                return Err(SchedError::InvalidSchedule(format!(
                    "warm start does not place '{name}'"
                )));
            };
            let candidates = &self.candidates[id.index()];
            if !candidates.iter().any(|&(t, _)| t == cycle) {
                return Err(SchedError::InvalidSchedule(format!(
                    "warm start places '{name}' in cycle {}, outside its window",
                    cycle + 1
                )));
            }
            for &(t, var) in candidates {
                self.model.suggest(var, i64::from(t == cycle));
            }
        }

        self.model.suggest(self.makespan, schedule.latency() as i64);
        Ok(())
    }

    /// Read a schedule back from solver values.
    pub fn extract(&self, solution: &Solution) -> Result<Schedule> {
        let mut placed: Vec<(OpId, usize)> = Vec::with_capacity(self.graph.len());

        for id in self.graph.ids() {
            let chosen: Vec<usize> = self.candidates[id.index()]
                .iter()
                .filter(|&&(_, var)| solution.value(var) == 1)
                .map(|&(t, _)| t)
                .collect();
            match chosen.as_slice() {
                [t] => placed.push((id, *t)),
                _ => {
                    return Err(SchedError::InvalidSchedule(format!(
                        "solver assigned '{}' to {} cycles",
                        self.graph.name(id),
                        chosen.len()
                    )));
                }
            }
        }

        let makespan = usize::try_from(solution.value(self.makespan)).unwrap_or(0);
        let used = placed.iter().map(|&(_, t)| t + 1).max().unwrap_or(0);
        if makespan != used {
            warn!(
                makespan,
                used,
                upper_bound = self.upper_bound,
                "makespan variable is not tight; reporting the cycles in use"
            );
        }

        let mut cycles = vec![Cycle::new(); used];
        for (id, t) in placed {
            cycles[t].push(self.graph.kind(id), self.graph.name(id));
        }
        Ok(Schedule::from_cycles(cycles))
    }
}
