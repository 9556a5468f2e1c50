//! Runner configuration loaded from `waverun.toml`.
//!
//! [`WaverunConfig`] holds every tunable parameter. Values missing from the
//! file fall back to sensible defaults. The `WAVERUN_INTERPRETER` environment
//! variable takes precedence over the file for the script interpreter.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "waverun.toml";

/// Top-level configuration loaded from `waverun.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct WaverunConfig {
    /// Directory scanned for finite-radius input data.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory that receives extrapolated output.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Data file names that each make a work item when present.
    #[serde(default = "default_data_files")]
    pub data_files: Vec<String>,

    /// File that must sit next to the data for a directory to qualify.
    #[serde(default = "default_companion_file")]
    pub companion_file: String,

    /// Program used to run the generated launch script.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// How long a ledger transaction waits on a locked store.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Status recorded for claimed items during a dry run.
    #[serde(default = "default_dry_run_status")]
    pub dry_run_status: i32,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("FiniteRadiusData")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("ExtrapolatedData")
}

fn default_data_files() -> Vec<String> {
    vec![
        "rh_FiniteRadii_CodeUnits.h5".to_string(),
        "rPsi4_FiniteRadii_CodeUnits.h5".to_string(),
    ]
}

fn default_companion_file() -> String {
    "Horizons.h5".to_string()
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_busy_timeout_secs() -> u64 {
    60
}

fn default_dry_run_status() -> i32 {
    17
}

impl Default for WaverunConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            data_files: default_data_files(),
            companion_file: default_companion_file(),
            interpreter: default_interpreter(),
            busy_timeout_secs: default_busy_timeout_secs(),
            dry_run_status: default_dry_run_status(),
        }
    }
}

impl WaverunConfig {
    /// Loads `path`, or `waverun.toml` in the current directory when `path` is
    /// `None`. A missing default file yields the defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        if let Ok(interpreter) = std::env::var("WAVERUN_INTERPRETER")
            && !interpreter.is_empty()
        {
            config.interpreter = interpreter;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str::<WaverunConfig>(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WaverunConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("FiniteRadiusData"));
        assert_eq!(config.output_dir, PathBuf::from("ExtrapolatedData"));
        assert_eq!(config.companion_file, "Horizons.h5");
        assert_eq!(config.busy_timeout(), Duration::from_secs(60));
        assert_eq!(config.dry_run_status, 17);
        assert_eq!(config.data_files.len(), 2);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            output_dir = "/scratch/extrapolated"
            data_files = ["rMPsi4_Asymptotic_GeometricUnits.h5"]
            busy_timeout_secs = 5
        "#;
        let config: WaverunConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/scratch/extrapolated"));
        assert_eq!(config.data_files, vec!["rMPsi4_Asymptotic_GeometricUnits.h5"]);
        assert_eq!(config.busy_timeout_secs, 5);
        assert_eq!(config.input_dir, PathBuf::from("FiniteRadiusData"));
        assert_eq!(config.dry_run_status, 17);
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "dry_run_status = 3\n").unwrap();
        let config = WaverunConfig::load(Some(&path)).unwrap();
        assert_eq!(config.dry_run_status, 3);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WaverunConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "busy_timeout_secs = \"soon\"\n").unwrap();
        assert!(WaverunConfig::load(Some(&path)).is_err());
    }
}
