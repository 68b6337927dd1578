use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use gatesched::config::{ConfigFile, load_and_validate, load_from_path, validate_config};
use gatesched::errors::SchedError;
use gatesched::ilp::{SolverFocus, SolverParams};
use gatesched::netlist::GateKind;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn demo_config_loads() -> TestResult {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/Gatesched.toml");
    let cfg = load_and_validate(path)?;

    let limits = cfg.limits.clone().ok_or("missing [limits]")?;
    assert_eq!(limits.get(GateKind::And), Some(1));
    assert_eq!(limits.get(GateKind::Not), Some(2));

    let params = cfg.solver_params(10);
    assert_eq!(params.time_limit, Duration::from_secs(60));
    assert_eq!(params.mip_gap, 0.0);
    assert_eq!(params.threads, 2);
    assert_eq!(params.presolve_passes, 4);
    Ok(())
}

#[test]
fn empty_config_keeps_size_tiers() -> TestResult {
    let file = write_config("")?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg, ConfigFile::default());
    assert_eq!(cfg.solver_params(100), SolverParams::default());
    Ok(())
}

#[test]
fn size_tiers_grow_the_budget() {
    let small = SolverParams::for_size(5_000);
    let medium = SolverParams::for_size(5_001);
    let large = SolverParams::for_size(10_001);

    assert_eq!(small.time_limit, Duration::from_secs(600));
    assert_eq!(small.mip_gap, 0.05);
    assert_eq!(small.focus, SolverFocus::Balanced);

    assert_eq!(medium.time_limit, Duration::from_secs(1200));
    assert_eq!(medium.focus, SolverFocus::Feasibility);
    assert!(medium.mip_gap > small.mip_gap);

    assert_eq!(large.time_limit, Duration::from_secs(1800));
    assert!(large.mip_gap > medium.mip_gap);

    for params in [small, medium, large] {
        assert_eq!(params.threads, 4);
        assert_eq!(params.presolve_passes, 8);
    }
}

#[test]
fn partial_solver_section_overrides_only_its_keys() -> TestResult {
    let file = write_config("[solver]\nthreads = 1\nfocus = \"feasibility\"\n")?;
    let cfg = load_from_path(file.path())?;

    let params = cfg.solver_params(20_000);
    assert_eq!(params.threads, 1);
    assert_eq!(params.focus, SolverFocus::Feasibility);
    assert_eq!(params.time_limit, Duration::from_secs(1800));
    Ok(())
}

#[test]
fn out_of_range_values_are_config_errors() -> TestResult {
    for contents in [
        "[solver]\nmip_gap = 1.0\n",
        "[solver]\nmip_gap = -0.1\n",
        "[solver]\ntime_limit_secs = 0\n",
        "[solver]\nthreads = 0\n",
    ] {
        let file = write_config(contents)?;
        let result = load_and_validate(file.path());
        assert!(
            matches!(result, Err(SchedError::ConfigError(_))),
            "expected ConfigError for {contents:?}, got {result:?}"
        );
    }
    Ok(())
}

#[test]
fn unknown_keys_and_bad_types_are_toml_errors() -> TestResult {
    for contents in [
        "[solver]\nturbo = true\n",
        "[limits]\nxor = 1\n",
        "[solver]\nfocus = \"fast\"\n",
        "[limits]\nand = -1\n",
    ] {
        let file = write_config(contents)?;
        let result = load_from_path(file.path());
        assert!(
            matches!(result, Err(SchedError::TomlError(_))),
            "expected TomlError for {contents:?}, got {result:?}"
        );
    }
    Ok(())
}

#[test]
fn validation_accepts_defaults() -> TestResult {
    validate_config(&ConfigFile::default())?;
    Ok(())
}

#[test]
fn focus_parses_from_strings() {
    assert_eq!("Balanced".parse::<SolverFocus>(), Ok(SolverFocus::Balanced));
    assert_eq!(" feasibility ".parse::<SolverFocus>(), Ok(SolverFocus::Feasibility));
    assert!("fast".parse::<SolverFocus>().is_err());
}
