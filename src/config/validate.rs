// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, SchedError};

/// Check value ranges of a loaded configuration:
/// - `[solver].mip_gap` in `[0, 1)`
/// - `[solver].time_limit_secs >= 1`
/// - `[solver].threads >= 1`
///
/// Limits of 0 are accepted here; whether they are schedulable depends on
/// the netlist.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    let solver = &cfg.solver;

    if let Some(gap) = solver.mip_gap {
        if !(0.0..1.0).contains(&gap) {
            return Err(SchedError::ConfigError(format!(
                "[solver].mip_gap must be in [0, 1) (got {gap})"
            )));
        }
    }

    if solver.time_limit_secs == Some(0) {
        return Err(SchedError::ConfigError(
            "[solver].time_limit_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if solver.threads == Some(0) {
        return Err(SchedError::ConfigError(
            "[solver].threads must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
