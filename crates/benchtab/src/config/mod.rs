//! Configuration loading for benchtab.
//! Reads benchtab.toml from the current directory or the path in the
//! BENCHTAB_CONFIG env var. Files ending in `.yaml`/`.yml` are read as YAML.

use std::path::{Path, PathBuf};

use anyhow::Context;
use benchtab_common::{BenchError, Result};
use benchtab_ranker::{AggregateMode, AggregateSpec, AggregatedFromPolicy, ScenarioFilter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub aggregates: Vec<AggregateConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_dir")]
    pub dir: PathBuf,
    /// Text file, one lower-is-better benchmark per line.
    pub lower_is_better: Option<PathBuf>,
    /// JSON object mapping canonical scenario keys to display names.
    pub display_names: Option<PathBuf>,
}

fn default_catalog_dir() -> PathBuf { PathBuf::from("./benchmarks") }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { dir: default_catalog_dir(), lower_is_better: None, display_names: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_missing_markers")]
    pub missing_markers: Vec<String>,
    #[serde(default)]
    pub already_canonical: bool,
}

fn default_missing_markers() -> Vec<String> { vec!["-".to_string()] }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { missing_markers: default_missing_markers(), already_canonical: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub preferred_source: Option<String>,
}

fn bool_true() -> bool { true }

impl Default for DedupConfig {
    fn default() -> Self {
        Self { enabled: bool_true(), preferred_source: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub name: String,
    #[serde(default)]
    pub mode: AggregateMode,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub whitelist: Vec<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub min_scenarios_present: usize,
    #[serde(default)]
    pub aggregated_from: AggregatedFromPolicy,
}

impl AggregateConfig {
    pub fn to_spec(&self) -> Result<AggregateSpec> {
        let filter = ScenarioFilter::from_lists(self.blacklist.clone(), self.whitelist.clone())?;
        let mut spec = AggregateSpec::new(self.name.clone(), self.mode)
            .with_filter(filter)
            .with_min_scenarios_present(self.min_scenarios_present)
            .with_aggregated_from(self.aggregated_from);
        if let Some(source) = &self.source {
            spec = spec.with_source(source.clone());
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize { 10 }

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: default_top_n() }
    }
}


impl Config {
    /// Load configuration from benchtab.toml.
    /// Checks BENCHTAB_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("BENCHTAB_CONFIG")
            .unwrap_or_else(|_| "benchtab.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy benchtab.example.toml to benchtab.toml and edit it.",
                path
            );
        }

        Self::from_path(Path::new(&path))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        let config = if is_yaml {
            serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))?
        } else {
            toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?
        };
        Ok(config)
    }

    /// Aggregate specs in declaration order. Names must be unique.
    pub fn aggregate_specs(&self) -> Result<Vec<AggregateSpec>> {
        let mut specs: Vec<AggregateSpec> = Vec::with_capacity(self.aggregates.len());
        for agg in &self.aggregates {
            if specs.iter().any(|s| s.name == agg.name) {
                return Err(BenchError::Config(format!("aggregate '{}' is declared twice", agg.name)));
            }
            specs.push(agg.to_spec()?);
        }
        Ok(specs)
    }
}
