// src/ilp/mod.rs

//! Exact scheduling through an integer linear model.
//!
//! - [`model`] is the solver-independent model (variables, rows, objective).
//! - [`solver`] holds the [`MipSolver`] seam and the budget value object.
//! - [`branch_bound`] is the built-in backend.
//! - [`builder`] turns a graph and its bounds into a scheduling model.
//!
//! [`optimize`] drives the whole path: list schedule, bounds, model, warm
//! start, solve, extract, check.

pub mod branch_bound;
pub mod builder;
pub mod model;
pub mod solver;

pub use branch_bound::BranchAndBound;
pub use builder::{ScheduleModel, latency_lower_bound};
pub use model::{
    Constraint, LinExpr, Model, Relation, Sense, Solution, SolveOutcome, SolveStatus, VarId,
    VarKind, Variable,
};
pub use solver::{MipSolver, SolverFocus, SolverParams};

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::{Bounds, OperationGraph, list_schedule};
use crate::errors::{NoSolutionReason, Result, SchedError};
use crate::schedule::{ResourceLimits, Schedule};

/// Optimized schedule plus how the solver got there.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub schedule: Schedule,
    /// Latency of the list schedule used as upper bound and warm start.
    pub heuristic_latency: usize,
    /// Proven lower bound on the latency.
    pub lower_bound: usize,
    pub status: SolveStatus,
}

/// Schedule `graph` with the exact model, returning only the schedule.
pub fn optimize(
    graph: &OperationGraph,
    limits: &ResourceLimits,
    params: &SolverParams,
    solver: &dyn MipSolver,
) -> Result<Schedule> {
    optimize_detailed(graph, limits, params, solver).map(|o| o.schedule)
}

/// Schedule `graph` with the exact model.
///
/// The list schedule always runs first; its latency bounds the model and its
/// assignment is the warm start. Infeasible models and empty budgets come
/// back as [`SchedError::NoScheduleFound`].
pub fn optimize_detailed(
    graph: &OperationGraph,
    limits: &ResourceLimits,
    params: &SolverParams,
    solver: &dyn MipSolver,
) -> Result<Optimized> {
    let heuristic = list_schedule(graph, limits)?;
    let upper_bound = heuristic.latency();
    let bounds = Bounds::compute(graph, upper_bound)?;
    let lower_bound = latency_lower_bound(graph, &bounds, limits);

    if lower_bound >= upper_bound {
        info!(
            latency = upper_bound,
            "list schedule meets the latency lower bound; skipping the solver"
        );
        return Ok(Optimized {
            schedule: heuristic,
            heuristic_latency: upper_bound,
            lower_bound: upper_bound,
            status: SolveStatus::Optimal,
        });
    }

    let mut sched_model = ScheduleModel::build(graph, &bounds, limits)?;
    sched_model.warm_start(&heuristic)?;

    info!(
        operations = graph.len(),
        variables = sched_model.model().num_vars(),
        constraints = sched_model.model().num_constraints(),
        lower_bound,
        upper_bound,
        time_limit_secs = params.time_limit.as_secs(),
        mip_gap = params.mip_gap,
        threads = params.threads,
        focus = ?params.focus,
        "solving scheduling model"
    );

    let started = Instant::now();
    let outcome = solver.solve(sched_model.model(), params)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (solution, status, bound) = match outcome {
        SolveOutcome::Solved {
            solution,
            status,
            bound,
        } => (solution, status, bound),
        SolveOutcome::Infeasible => {
            warn!(elapsed_ms, "scheduling model is infeasible");
            return Err(SchedError::NoScheduleFound(NoSolutionReason::Infeasible));
        }
        SolveOutcome::NoSolutionInBudget => {
            warn!(elapsed_ms, "solver found no schedule within its budget");
            return Err(SchedError::NoScheduleFound(
                NoSolutionReason::BudgetExhausted,
            ));
        }
    };

    let schedule = sched_model.extract(&solution)?;
    schedule.check(graph, limits)?;

    let proven = usize::try_from(bound).unwrap_or(0).max(lower_bound);
    info!(
        latency = schedule.latency(),
        heuristic_latency = upper_bound,
        lower_bound = proven,
        ?status,
        elapsed_ms,
        "optimization finished"
    );
    debug!(objective = solution.objective, "solver objective");

    Ok(Optimized {
        schedule,
        heuristic_latency: upper_bound,
        lower_bound: proven.min(upper_bound),
        status,
    })
}
