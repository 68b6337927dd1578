// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Load a configuration file and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// also check value ranges.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load a configuration file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// `Gatesched.toml` in the current working directory. It is only read when
/// it exists.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Gatesched.toml")
}
