use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BreakdownVar, MetricConfig};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
    /// Directory of the config file; relative dataset paths resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub metric: String,
    pub dimension: BreakdownVar,
    #[serde(default)]
    pub nonstandardized: bool,
    pub path: PathBuf, // .csv or .json
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn metric(&self, id: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|m| m.metric_id == id)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
port = 9000

[[metrics]]
id = "covid_cases_per_100k"
title = "COVID-19 cases per 100k"

[[metrics]]
id = "diabetes_per_100k"
title = "Diabetes cases per 100k"
supports_county = true

[[datasets]]
metric = "covid_cases_per_100k"
dimension = "race_and_ethnicity"
nonstandardized = true
path = "data/covid_race.csv"
"#;

    #[test]
    fn parses_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.metrics.len(), 2);
        assert!(!config.metric("covid_cases_per_100k").unwrap().supports_county);
        assert!(config.metric("diabetes_per_100k").unwrap().supports_county);
        assert!(config.metric("missing").is_none());

        let dataset = &config.datasets[0];
        assert_eq!(dataset.dimension, BreakdownVar::RaceAndEthnicity);
        assert!(dataset.nonstandardized);
    }

    #[test]
    fn defaults_when_sections_missing() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn rejects_unknown_dimension() {
        let bad = r#"
[[datasets]]
metric = "m"
dimension = "income"
path = "x.csv"
"#;
        assert!(AppConfig::from_toml(bad).is_err());
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let config = AppConfig {
            base_dir: PathBuf::from("/srv/maps"),
            ..AppConfig::default()
        };
        assert_eq!(config.resolve(Path::new("data/a.csv")), PathBuf::from("/srv/maps/data/a.csv"));
        assert_eq!(config.resolve(Path::new("/abs/b.csv")), PathBuf::from("/abs/b.csv"));
    }
}
