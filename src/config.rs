//! TOML run configuration with defaults and range validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::similarity::{ScanConfig, SimilarityMetric, DEFAULT_THRESHOLD};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimilarityConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub metric: SimilarityMetric,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
            metric: SimilarityMetric::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Compute and report the diff without writing the catalog.
    #[serde(default)]
    pub dry_run: bool,
}

impl SimilarityConfig {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            enabled: self.enabled,
            threshold: self.threshold,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity.threshold) {
            anyhow::bail!("similarity.threshold must be in [0.0, 1.0]");
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
