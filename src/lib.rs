// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod ilp;
pub mod logging;
pub mod netlist;
pub mod report;
pub mod schedule;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use crate::cli::{CliArgs, Mode};
use crate::config::{ConfigFile, default_config_path, load_and_validate};
use crate::dag::{OperationGraph, asap, critical_path_lengths, list_schedule};
use crate::ilp::{BranchAndBound, SolverParams};
use crate::netlist::{GateKind, Operation, load_blif};
use crate::schedule::{ResourceLimits, Schedule};

/// Schedule operations with the list-scheduling heuristic.
pub fn schedule(
    operations: &[Operation],
    primary_inputs: &[String],
    primary_outputs: &[String],
    limits: &ResourceLimits,
) -> errors::Result<Schedule> {
    let graph = OperationGraph::build(operations, primary_inputs, primary_outputs)?;
    list_schedule(&graph, limits)
}

/// Schedule operations with the exact model and the built-in solver.
///
/// Fails with [`errors::SchedError::NoScheduleFound`] when the solver gives
/// up; [`schedule`] on the same input still works in that case.
pub fn optimize(
    operations: &[Operation],
    primary_inputs: &[String],
    primary_outputs: &[String],
    limits: &ResourceLimits,
    params: &SolverParams,
) -> errors::Result<Schedule> {
    let graph = OperationGraph::build(operations, primary_inputs, primary_outputs)?;
    ilp::optimize(&graph, limits, params, &BranchAndBound::new())
}

/// High-level entry point used by `main.rs`.
///
/// Loads the config and netlist, runs the selected scheduler and prints the
/// report on stdout.
pub fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;

    let netlist = load_blif(&args.blif)
        .with_context(|| format!("reading netlist at {:?}", args.blif))?;
    let graph = OperationGraph::from_netlist(&netlist).context("building dependency graph")?;

    if args.dry_run {
        let critical = critical_path_lengths(&graph)?;
        let earliest = asap(&graph)?;
        print!(
            "{}",
            report::render_summary(&netlist, &graph, &critical, &earliest)
        );
        debug!("dry-run complete (nothing scheduled)");
        return Ok(());
    }

    let limits = resolve_limits(&args, &cfg)?;
    let mut mode = args.mode();

    let schedule = match mode {
        Mode::Heuristic => list_schedule(&graph, &limits).context("list scheduling")?,
        Mode::Exact => {
            let params = cfg.solver_params(graph.len());
            match ilp::optimize(&graph, &limits, &params, &BranchAndBound::new()) {
                Ok(schedule) => schedule,
                Err(err) if args.fallback && err.is_solver_outcome() => {
                    warn!(error = %err, "exact scheduling failed; printing the heuristic schedule");
                    mode = Mode::Heuristic;
                    list_schedule(&graph, &limits).context("list scheduling")?
                }
                Err(err) => return Err(err).context("exact scheduling"),
            }
        }
    };

    print!("{}", report::render(&schedule, mode));
    Ok(())
}

/// An explicit `--config` must exist; the default path is optional.
fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config file at {:?}", path)),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)
                    .with_context(|| format!("loading config file at {:?}", path))
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Command-line limits win over `[limits]` in the config.
fn resolve_limits(args: &CliArgs, cfg: &ConfigFile) -> Result<ResourceLimits> {
    let configured = cfg.limits.clone().unwrap_or_default();
    let mut limits = ResourceLimits::new(0, 0, 0);

    for (kind, given) in [
        (GateKind::And, args.and),
        (GateKind::Or, args.or),
        (GateKind::Not, args.not),
    ] {
        let limit = given.or(configured.get(kind)).ok_or_else(|| {
            anyhow!(
                "no {kind} limit: pass it on the command line or set [limits].{} in the config",
                kind.as_str().to_lowercase()
            )
        })?;
        limits.set(kind, limit);
    }

    Ok(limits)
}
