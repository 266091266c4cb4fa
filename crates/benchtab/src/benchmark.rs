//! `Benchmark`: one analysis session over a single benchmark table.
//!
//! Owns the table and the immutable collaborators every ingest needs (name
//! normaliser, lower-is-better registry, missing markers), loaded once at
//! startup and passed down explicitly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use benchtab_common::{DisplayNameRegistry, LowerIsBetterRegistry, RawTable, Record, Result};
use benchtab_db::{CoOccurrence, DatasetTable, TableSnapshot};
use benchtab_ingestion::{
    clear_repeated_scenarios, ingest, load_catalog, write_csv, DedupReport, IngestContext, IngestOptions,
    IngestReport, NameNormaliser,
};
use benchtab_ranker::{add_aggregate, normalise_table, AggregateSpec, AggregateSummary};
use tracing::info;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Benchmark {
    table: DatasetTable,
    normaliser: NameNormaliser,
    lower_is_better: LowerIsBetterRegistry,
    missing_markers: Vec<String>,
    already_canonical: bool,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new(NameNormaliser::default(), LowerIsBetterRegistry::default())
    }
}

impl Benchmark {
    pub fn new(normaliser: NameNormaliser, lower_is_better: LowerIsBetterRegistry) -> Self {
        Self {
            table: DatasetTable::new(),
            normaliser,
            lower_is_better,
            missing_markers: vec!["-".to_string()],
            already_canonical: false,
        }
    }

    /// Build a session from config, reading the registry files it names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let display_names = match &config.catalog.display_names {
            Some(path) => DisplayNameRegistry::from_file(path)?,
            None => DisplayNameRegistry::default(),
        };
        let lower_is_better = match &config.catalog.lower_is_better {
            Some(path) => LowerIsBetterRegistry::from_file(path)?,
            None => LowerIsBetterRegistry::default(),
        };
        info!(
            display_names = display_names.len(),
            lower_is_better = lower_is_better.len(),
            "Registries loaded"
        );
        let mut bench = Self::new(NameNormaliser::new(display_names), lower_is_better)
            .with_missing_markers(config.ingestion.missing_markers.clone());
        bench.already_canonical = config.ingestion.already_canonical;
        Ok(bench)
    }

    /// Start from an initial raw table.
    pub fn from_raw(raw: &RawTable, options: &IngestOptions) -> Result<Self> {
        let mut bench = Self::default();
        bench.ingest(raw, options)?;
        Ok(bench)
    }

    pub fn with_missing_markers(mut self, markers: Vec<String>) -> Self {
        self.missing_markers = markers;
        self
    }

    pub fn table(&self) -> &DatasetTable {
        &self.table
    }

    pub fn records(&self) -> &[Record] {
        self.table.records()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        self.table.snapshot()
    }

    pub fn normaliser(&self) -> &NameNormaliser {
        &self.normaliser
    }

    fn context(&self) -> IngestContext<'_> {
        IngestContext::new(&self.normaliser, &self.lower_is_better)
            .with_missing_markers(self.missing_markers.clone())
    }

    // ── Growth ────────────────────────────────────────────────────────────────

    pub fn ingest(&mut self, raw: &RawTable, options: &IngestOptions) -> Result<IngestReport> {
        let mut options = options.clone();
        options.already_canonical |= self.already_canonical;
        let ctx = IngestContext::new(&self.normaliser, &self.lower_is_better)
            .with_missing_markers(self.missing_markers.clone());
        ingest(&mut self.table, raw, &options, &ctx)
    }

    /// Merge another session's rows. Returns the number of collapsed duplicates.
    pub fn extend(&mut self, other: &Benchmark) -> usize {
        self.table.extend(other.records().to_vec())
    }

    /// Ingest every CSV file of a catalog directory, each as its own source.
    pub fn load_local_catalog(&mut self, dir: &Path) -> Result<Vec<IngestReport>> {
        let entries = load_catalog(dir)?;
        let ctx = self.context();
        let mut staged = self.table.clone();
        let mut reports = Vec::with_capacity(entries.len());
        for entry in &entries {
            let options = IngestOptions {
                source: Some(entry.source.clone()),
                already_canonical: self.already_canonical,
            };
            reports.push(ingest(&mut staged, &entry.table, &options, &ctx)?);
        }
        self.table = staged;
        Ok(reports)
    }

    // ── Transformations ───────────────────────────────────────────────────────

    pub fn normalize(&mut self, lower_is_better: bool) {
        normalise_table(&mut self.table, lower_is_better);
    }

    pub fn add_aggregate(&mut self, spec: &AggregateSpec) -> Result<AggregateSummary> {
        add_aggregate(&mut self.table, spec)
    }

    pub fn clear_repeated_scenarios(&mut self, preferred_source: Option<&str>) -> DedupReport {
        clear_repeated_scenarios(&mut self.table, preferred_source)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn models(&self) -> Vec<String> {
        self.table.distinct_models()
    }

    pub fn scenarios(&self) -> Vec<String> {
        self.table.distinct_scenarios()
    }

    pub fn sources(&self) -> Vec<String> {
        self.table.distinct_sources()
    }

    pub fn model_coverage(&self) -> Vec<(String, usize)> {
        self.table.model_coverage_counts()
    }

    pub fn scenario_coverage(&self) -> Vec<(String, usize)> {
        self.table.scenario_coverage_counts()
    }

    /// Best `n` rows of one scenario.
    pub fn leaderboard(&self, scenario: &str, n: usize) -> Vec<&Record> {
        let mut ranking = self.table.ranking(scenario);
        ranking.truncate(n);
        ranking
    }

    pub fn scenario_overlap(&self) -> CoOccurrence {
        self.table.scenario_overlap()
    }

    // ── Export ────────────────────────────────────────────────────────────────

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_csv(self.records(), writer)
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)?;
        info!(path = %path.display(), rows = self.table.len(), "Exported benchmark table");
        Ok(())
    }
}
