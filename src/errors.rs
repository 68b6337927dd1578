// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Library code returns [`SchedError`]; the CLI layer wraps it in `anyhow`
//! with extra context.

use thiserror::Error;

use crate::netlist::GateKind;

/// Why the optimization path produced no schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSolutionReason {
    /// The model has no feasible assignment.
    Infeasible,
    /// The solver budget ran out before any feasible assignment was found.
    BudgetExhausted,
}

impl std::fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoSolutionReason::Infeasible => write!(f, "model is infeasible"),
            NoSolutionReason::BudgetExhausted => {
                write!(f, "no solution found within the solver budget")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("duplicate output signal '{0}'")]
    DuplicateOutput(String),

    #[error("malformed operation '{output}': {reason}")]
    MalformedOperation { output: String, reason: String },

    #[error("dependency cycle detected involving '{0}'")]
    DependencyCycle(String),

    #[error(
        "{kind} operations cannot be scheduled with a resource limit of 0: {}",
        .operations.join(", ")
    )]
    Unschedulable {
        kind: GateKind,
        operations: Vec<String>,
    },

    #[error("scheduler stalled at cycle {cycle} with {pending} operation(s) left")]
    Stalled { cycle: usize, pending: usize },

    #[error("upper bound {upper_bound} is too small for operation '{operation}'")]
    UpperBoundTooSmall {
        upper_bound: usize,
        operation: String,
    },

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("no schedule found: {0}")]
    NoScheduleFound(NoSolutionReason),

    #[error("solver error {code}: {message}")]
    Solver { code: i32, message: String },

    #[error("netlist parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SchedError {
    /// True when the optimization path gave up (infeasible, out of budget or
    /// a solver failure). Callers can fall back to the heuristic schedule.
    pub fn is_solver_outcome(&self) -> bool {
        matches!(
            self,
            SchedError::NoScheduleFound(_) | SchedError::Solver { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SchedError>;
