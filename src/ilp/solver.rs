// src/ilp/solver.rs

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::ilp::model::{Model, SolveOutcome};

/// What the search should favour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverFocus {
    /// Search until optimal or within the gap tolerance.
    #[default]
    Balanced,
    /// Stop as soon as a solution better than the start is found.
    Feasibility,
}

impl FromStr for SolverFocus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(SolverFocus::Balanced),
            "feasibility" => Ok(SolverFocus::Feasibility),
            other => Err(format!(
                "invalid solver focus: {other} (expected \"balanced\" or \"feasibility\")"
            )),
        }
    }
}

/// Budget and tuning for a single solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    pub time_limit: Duration,
    /// Relative optimality gap at which the search may stop.
    pub mip_gap: f64,
    /// Worker threads; 1 keeps the search deterministic.
    pub threads: usize,
    pub focus: SolverFocus,
    /// Rounds of root probing before the search starts; 0 disables it.
    pub presolve_passes: u32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(600),
            mip_gap: 0.05,
            threads: 4,
            focus: SolverFocus::Balanced,
            presolve_passes: 8,
        }
    }
}

impl SolverParams {
    /// Budget tiers by operation count: larger netlists get more time, a
    /// looser gap and a feasibility-first search.
    pub fn for_size(operations: usize) -> Self {
        let base = Self::default();
        if operations > 10_000 {
            Self {
                time_limit: Duration::from_secs(1800),
                mip_gap: 0.10,
                focus: SolverFocus::Feasibility,
                ..base
            }
        } else if operations > 5_000 {
            Self {
                time_limit: Duration::from_secs(1200),
                mip_gap: 0.08,
                focus: SolverFocus::Feasibility,
                ..base
            }
        } else {
            base
        }
    }
}

/// An integer programming backend.
///
/// Implementations return `Ok` for every ordinary outcome (solved,
/// infeasible, out of budget) and reserve `Err` for failures of the backend
/// itself.
pub trait MipSolver {
    fn solve(&self, model: &Model, params: &SolverParams) -> Result<SolveOutcome>;
}
