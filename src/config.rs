//! Dashboard Configuration
//! JSON file settings layered under command-line overrides.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Command line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "suicide_dashboard", version, about = "Suicide statistics explorer")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CSV file to load (overrides `source_path`)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Initial country for the trend view
    #[arg(long)]
    pub country: Option<String>,

    /// Directory for PNG charts and the JSON report
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the report and export instead of opening a window
    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source_path: PathBuf,
    pub country: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub histogram_bins: usize,
    /// Size of the "most suicides" ranking block
    pub ranking_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("master.csv"),
            country: None,
            export_dir: None,
            histogram_bins: 30,
            ranking_size: 5,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the config file if given, then command-line values.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(source) = &cli.source {
            config.source_path = source.clone();
        }
        if let Some(country) = &cli.country {
            config.country = Some(country.clone());
        }
        if let Some(export) = &cli.export {
            config.export_dir = Some(export.clone());
        }
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
        write!(file, r#"{{"source_path": "data/master.csv", "histogram_bins": 12}}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source_path, PathBuf::from("data/master.csv"));
        assert_eq!(config.histogram_bins, 12);
        assert_eq!(config.ranking_size, 5);
        assert_eq!(config.country, None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"source_path": "a.csv", "country": "Chile"}}"#).unwrap();

        let cli = Cli::parse_from([
            "suicide_dashboard",
            "--config",
            file.path().to_str().unwrap(),
            "--source",
            "b.csv",
        ]);
        let config = DashboardConfig::resolve(&cli).unwrap();
        assert_eq!(config.source_path, PathBuf::from("b.csv"));
        assert_eq!(config.country.as_deref(), Some("Chile"));
        assert!(!cli.headless);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(DashboardConfig::resolve(&Cli::default()).unwrap(), DashboardConfig::default());
    }
}
