// src/config/mod.rs

//! Optional TOML configuration for gatesched.
//!
//! - `model.rs` maps the `[limits]` and `[solver]` tables.
//! - `loader.rs` reads a file from disk.
//! - `validate.rs` checks value ranges before anything is scheduled.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, LimitsSection, SolverSection};
pub use validate::validate_config;
