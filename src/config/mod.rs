use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Observation periods per year. The dataset is sampled weekly, hence 52;
    /// this is configuration, never inferred from the data, so a change of
    /// cadence cannot silently mis-annualize.
    pub periods_per_year: f64,
    pub risk_free_rate: f64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            periods_per_year: 52.0,
            risk_free_rate: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub significance_level: f64,
    pub min_securities: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_securities: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub plot_path: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            plot_path: PathBuf::from("target/risk_return.svg"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsSettings,
    pub model: ModelSettings,
    pub report: ReportSettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the config file if present, otherwise run on compiled defaults.
    /// A file that exists but does not parse is still a hard error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(
                "config {} not found, using built-in defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_relative_eq!(config.metrics.periods_per_year, 52.0);
        assert_relative_eq!(config.metrics.risk_free_rate, 0.02);
        assert_relative_eq!(config.model.significance_level, 0.05);
        assert_eq!(config.model.min_securities, 3);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"metrics:\n  periods_per_year: 12\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_relative_eq!(config.metrics.periods_per_year, 12.0);
        assert_relative_eq!(config.metrics.risk_free_rate, 0.02);
        assert_relative_eq!(config.model.significance_level, 0.05);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("does/not/exist.yaml").unwrap();
        assert_eq!(config.model.min_securities, 3);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"metrics: [not, a, map]\n").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }
}
