//! The canonical in-memory dataset table.
//!
//! Rows live behind a shared, immutable buffer. Every mutation builds a new
//! buffer and swaps it in, bumping `version`; snapshots taken earlier keep
//! seeing the rows they were taken from.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use benchtab_common::Record;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::overlap::CoOccurrence;

/// Immutable view of the table at one version.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    version: u64,
    taken_at: DateTime<Utc>,
    records: Arc<[Record]>,
}

impl TableSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Long-form table of `(model, scenario, score, source, aggregated_from)` rows.
///
/// `(model, scenario, source)` is unique across rows.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    records: Arc<[Record]>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Default for DatasetTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetTable {
    pub fn new() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Build from rows, collapsing duplicate keys to their best score.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut table = Self::new();
        table.extend(records);
        table
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            version: self.version,
            taken_at: Utc::now(),
            records: Arc::clone(&self.records),
        }
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    fn swap_in(&mut self, records: Vec<Record>) {
        self.records = Arc::from(records);
        self.version += 1;
        self.updated_at = Utc::now();
        debug!(version = self.version, rows = self.records.len(), "Table replaced");
    }

    /// Append rows. Returns how many duplicate rows were collapsed.
    pub fn extend(&mut self, batch: Vec<Record>) -> usize {
        let mut merged = Vec::with_capacity(self.records.len() + batch.len());
        merged.extend(self.records.iter().cloned());
        merged.extend(batch);
        self.replace_records(merged)
    }

    /// Whole-table replacement. Returns how many duplicate rows were collapsed.
    pub fn replace_records(&mut self, records: Vec<Record>) -> usize {
        let (records, collapsed) = collapse_duplicates(records);
        if collapsed > 0 {
            warn!(
                collapsed,
                "Duplicate (model, scenario, source) entries found. Keeping rows with the best scores."
            );
        }
        self.swap_in(records);
        collapsed
    }

    /// Keep only rows matching `keep`. Returns the number of rows removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Record) -> bool) -> usize {
        let before = self.records.len();
        let kept: Vec<Record> = self.records.iter().filter(|r| keep(r)).cloned().collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.swap_in(kept);
        }
        removed
    }

    // ── Read-only statistics ──────────────────────────────────────────────────

    /// Distinct models, in first-appearance order.
    pub fn distinct_models(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.model.as_str()))
    }

    /// Distinct scenarios, in first-appearance order.
    pub fn distinct_scenarios(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.scenario.as_str()))
    }

    /// Distinct sources, in first-appearance order.
    pub fn distinct_sources(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.source.as_str()))
    }

    /// Model → number of distinct scenarios it appears in, most covered first.
    pub fn model_coverage_counts(&self) -> Vec<(String, usize)> {
        coverage(self.records.iter().map(|r| (r.model.as_str(), r.scenario.as_str())))
    }

    /// Scenario → number of distinct models evaluated on it, most covered first.
    pub fn scenario_coverage_counts(&self) -> Vec<(String, usize)> {
        coverage(self.records.iter().map(|r| (r.scenario.as_str(), r.model.as_str())))
    }

    /// Rows of one scenario, best score first (ties by model name).
    pub fn ranking(&self, scenario: &str) -> Vec<&Record> {
        let mut rows: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.scenario == scenario)
            .collect();
        rows.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.model.cmp(&b.model)));
        rows
    }

    /// Scenario × scenario shared-model counts, busiest scenarios first.
    pub fn scenario_overlap(&self) -> CoOccurrence {
        CoOccurrence::from_pairs(self.records.iter().map(|r| (r.scenario.as_str(), r.model.as_str())))
            .sorted_by_row_sum()
    }
}

/// Collapse rows sharing `(model, scenario, source)` to the one with the
/// highest score. The first row wins ties; group order is first appearance.
pub fn collapse_duplicates(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut slot: HashMap<(String, String, String), usize> = HashMap::with_capacity(records.len());
    let mut kept: Vec<Record> = Vec::with_capacity(records.len());
    let mut collapsed = 0usize;

    for record in records {
        let key = (record.model.clone(), record.scenario.clone(), record.source.clone());
        match slot.get(&key) {
            Some(&i) => {
                collapsed += 1;
                if record.score > kept[i].score {
                    kept[i] = record;
                }
            }
            None => {
                slot.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    (kept, collapsed)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

fn coverage<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(String, usize)> {
    let mut sets: HashMap<&str, HashSet<&str>> = HashMap::new();
    for (key, value) in pairs {
        sets.entry(key).or_default().insert(value);
    }
    let mut counts: Vec<(String, usize)> = sets
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.len()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

// ── Tests ─────────────────────────────────────────────────────────────────────
