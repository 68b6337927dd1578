// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Command-line arguments for `gatesched`.
///
/// `-h` selects the heuristic, as the classic invocation
/// `gatesched -h design.blif 2 1 1` expects; help is `--help` only.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gatesched",
    version,
    about = "Schedule AND/OR/NOT gate netlists under per-type resource limits.",
    long_about = None,
    disable_help_flag = true
)]
pub struct CliArgs {
    /// List scheduling with critical-path priority (default).
    #[arg(short = 'h', long, conflicts_with = "exact")]
    pub heuristic: bool,

    /// Latency-optimal scheduling through the integer model.
    #[arg(short = 'e', long)]
    pub exact: bool,

    /// Netlist in BLIF format.
    #[arg(value_name = "BLIF")]
    pub blif: PathBuf,

    /// AND gates per cycle. Falls back to `[limits].and` in the config.
    #[arg(value_name = "AND")]
    pub and: Option<usize>,

    /// OR gates per cycle. Falls back to `[limits].or` in the config.
    #[arg(value_name = "OR")]
    pub or: Option<usize>,

    /// NOT gates per cycle. Falls back to `[limits].not` in the config.
    #[arg(value_name = "NOT")]
    pub not: Option<usize>,

    /// Path to a config file (TOML).
    ///
    /// Default: `Gatesched.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GATESCHED_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// With `--exact`: print the heuristic schedule if the solver finds none.
    #[arg(long, requires = "exact")]
    pub fallback: bool,

    /// Parse the netlist and print its structure without scheduling.
    #[arg(long)]
    pub dry_run: bool,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Which scheduler produces the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Heuristic,
    Exact,
}

impl CliArgs {
    pub fn mode(&self) -> Mode {
        if self.exact {
            Mode::Exact
        } else {
            Mode::Heuristic
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
