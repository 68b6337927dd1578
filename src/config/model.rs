// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::ilp::{SolverFocus, SolverParams};
use crate::netlist::GateKind;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [limits]
/// and = 2
/// or = 1
/// not = 1
///
/// [solver]
/// time_limit_secs = 600
/// mip_gap = 0.05
/// threads = 4
/// focus = "balanced"
/// presolve_passes = 8
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub limits: Option<LimitsSection>,

    #[serde(default)]
    pub solver: SolverSection,
}

/// `[limits]` section. Limits given on the command line take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub and: Option<usize>,
    pub or: Option<usize>,
    pub not: Option<usize>,
}

impl LimitsSection {
    pub fn get(&self, kind: GateKind) -> Option<usize> {
        match kind {
            GateKind::And => self.and,
            GateKind::Or => self.or,
            GateKind::Not => self.not,
        }
    }
}

/// `[solver]` section.
///
/// Unset keys keep the size-based default from [`SolverParams::for_size`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSection {
    pub time_limit_secs: Option<u64>,
    pub mip_gap: Option<f64>,
    pub threads: Option<usize>,
    pub focus: Option<SolverFocus>,
    pub presolve_passes: Option<u32>,
}

impl SolverSection {
    /// Overlay the configured keys on `params`.
    pub fn apply(&self, mut params: SolverParams) -> SolverParams {
        if let Some(secs) = self.time_limit_secs {
            params.time_limit = Duration::from_secs(secs);
        }
        if let Some(gap) = self.mip_gap {
            params.mip_gap = gap;
        }
        if let Some(threads) = self.threads {
            params.threads = threads;
        }
        if let Some(focus) = self.focus {
            params.focus = focus;
        }
        if let Some(passes) = self.presolve_passes {
            params.presolve_passes = passes;
        }
        params
    }
}

impl ConfigFile {
    /// Solver parameters for a netlist of `operations` gates.
    pub fn solver_params(&self, operations: usize) -> SolverParams {
        self.solver.apply(SolverParams::for_size(operations))
    }
}
