//! Simulation configuration
//!
//! Resolution order: command-line flags, then the TOML file, then the
//! built-in defaults below.

use anyhow::{Context, Result};
use pool_model::{ExpParams, Uint};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Loaded when `--config` is not given; absent is fine
pub const DEFAULT_CONFIG_PATH: &str = "poolsim.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Swap fee for `poolsim new`, in ppm
    pub swap_fee: u32,
    /// Simulated users created by `poolsim new`
    pub num_of_users: usize,
    /// Reserve tokens minted to each simulated user
    #[serde(with = "pool_model::decimal")]
    pub initial_amount: Uint,
    /// CSV report written by `poolsim run`
    pub report: PathBuf,
    /// Parameters for `poolsim exp-terms`
    pub exp: ExpParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            swap_fee: 2000,
            num_of_users: 2,
            initial_amount: Uint::from(1000u32),
            report: PathBuf::from("example_report.csv"),
            exp: ExpParams::default(),
        }
    }
}

impl SimConfig {
    /// Load from an explicit path, or from [`DEFAULT_CONFIG_PATH`] if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::from_file(path)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    log::debug!("no {} found, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: SimConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;

        log::debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "swap_fee = 3000").unwrap();
        writeln!(file, "initial_amount = \"1000000000000000000000\"").unwrap();
        writeln!(file, "[exp]").unwrap();
        writeln!(file, "max_precision = 64").unwrap();

        let config = SimConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.swap_fee, 3000);
        assert_eq!(config.num_of_users, 2);
        assert_eq!(config.initial_amount, "1000000000000000000000".parse::<Uint>().unwrap());
        assert_eq!(config.exp.max_precision, 64);
        assert_eq!(config.exp.num_of_hi_terms, 7);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "swap_fees = 3000").unwrap();

        assert!(SimConfig::load(Some(file.path())).is_err());
    }
}
