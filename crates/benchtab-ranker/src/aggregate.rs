//! Synthetic aggregate scenarios.
//!
//! An aggregate summarises a subset of real scenarios into one new scenario
//! per model, either as the mean score or as the mean win-rate:
//!
//!   wr(x) = |{ y in scenario : x > y }| / (N - 1)
//!
//! Models that appear in fewer than `min(min_scenarios_present, n_selected)`
//! selected scenarios are left out of the aggregate.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use benchtab_common::{BenchError, Record, Result};
use benchtab_db::DatasetTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How per-scenario scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateMode {
    /// Arithmetic mean of the (normalised) scores.
    #[serde(rename = "mean")]
    Mean,
    /// Mean of per-scenario pairwise win-rates.
    #[default]
    #[serde(rename = "mwr")]
    MeanWinRate,
}

impl AggregateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMode::Mean => "mean",
            AggregateMode::MeanWinRate => "mwr",
        }
    }
}

impl fmt::Display for AggregateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(AggregateMode::Mean),
            "mwr" => Ok(AggregateMode::MeanWinRate),
            other => Err(BenchError::Usage(format!(
                "unknown aggregate mode '{other}', expected 'mean' or 'mwr'"
            ))),
        }
    }
}

/// Which scenarios feed an aggregate.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScenarioFilter {
    /// Every measured scenario.
    #[default]
    All,
    /// Every measured scenario except these.
    Blacklist(Vec<String>),
    /// Exactly these scenarios.
    Whitelist(Vec<String>),
}

impl ScenarioFilter {
    /// Build from optional black/white lists; supplying both is a usage error.
    pub fn from_lists(blacklist: Vec<String>, whitelist: Vec<String>) -> Result<Self> {
        match (blacklist.is_empty(), whitelist.is_empty()) {
            (true, true) => Ok(ScenarioFilter::All),
            (false, true) => Ok(ScenarioFilter::Blacklist(blacklist)),
            (true, false) => Ok(ScenarioFilter::Whitelist(whitelist)),
            (false, false) => Err(BenchError::Usage(
                "either a scenario blacklist or a scenario whitelist can be given, but not both".to_string(),
            )),
        }
    }

    fn blacklist(&self) -> &[String] {
        match self {
            ScenarioFilter::Blacklist(b) => b,
            _ => &[],
        }
    }

    fn selects(&self, record: &Record) -> bool {
        match self {
            ScenarioFilter::All => !record.is_aggregate(),
            ScenarioFilter::Blacklist(b) => !record.is_aggregate() && !b.contains(&record.scenario),
            ScenarioFilter::Whitelist(w) => w.contains(&record.scenario),
        }
    }
}

/// What goes into `aggregated_from` of the synthetic rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedFromPolicy {
    /// The scenarios that were actually aggregated.
    #[default]
    Selected,
    /// Every scenario in the table that is not blacklisted, whatever the filter.
    ExcludeBlacklisted,
}

/// Parameters of one aggregate.
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub name: String,
    pub filter: ScenarioFilter,
    pub mode: AggregateMode,
    /// Source stamped on the new rows; inferred when the table has one source.
    pub source: Option<String>,
    pub min_scenarios_present: usize,
    pub aggregated_from: AggregatedFromPolicy,
}

impl AggregateSpec {
    pub fn new(name: impl Into<String>, mode: AggregateMode) -> Self {
        Self {
            name: name.into(),
            filter: ScenarioFilter::All,
            mode,
            source: None,
            min_scenarios_present: 0,
            aggregated_from: AggregatedFromPolicy::default(),
        }
    }

    pub fn with_filter(mut self, filter: ScenarioFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_min_scenarios_present(mut self, n: usize) -> Self {
        self.min_scenarios_present = n;
        self
    }

    pub fn with_aggregated_from(mut self, policy: AggregatedFromPolicy) -> Self {
        self.aggregated_from = policy;
        self
    }
}

/// Outcome of an aggregate, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub name: String,
    pub mode: AggregateMode,
    pub source: String,
    pub selected_scenarios: Vec<String>,
    pub min_scenarios_applied: usize,
    pub models_included: usize,
    pub models_excluded: Vec<String>,
}

/// Win-rate of every score against the others in the same scenario.
pub fn win_rates(scores: &[f64]) -> Result<Vec<f64>> {
    if scores.len() < 2 {
        return Err(BenchError::Usage(format!(
            "mean win rate needs at least two models per scenario, got {}",
            scores.len()
        )));
    }
    let denom = (scores.len() - 1) as f64;
    Ok(scores
        .iter()
        .map(|&x| scores.iter().filter(|&&y| x > y).count() as f64 / denom)
        .collect())
}

fn resolve_source(records: &[Record], explicit: Option<&str>) -> Result<String> {
    if let Some(source) = explicit {
        return Ok(source.to_string());
    }
    let mut sources: Vec<&str> = Vec::new();
    for r in records {
        if !sources.contains(&r.source.as_str()) {
            sources.push(&r.source);
        }
    }
    match sources.as_slice() {
        [only] => Ok(only.to_string()),
        _ => Err(BenchError::AmbiguousSource {
            n_sources: sources.len(),
            sources: sources.join(", "),
        }),
    }
}

fn first_appearance<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).map(str::to_string).collect()
}

/// Compute the synthetic rows of an aggregate without touching any table.
pub fn compute_aggregate(records: &[Record], spec: &AggregateSpec) -> Result<(Vec<Record>, AggregateSummary)> {
    if spec.name.trim().is_empty() {
        return Err(BenchError::Usage("aggregate name must not be empty".to_string()));
    }
    if records.iter().any(|r| r.scenario == spec.name) {
        return Err(BenchError::Usage(format!(
            "scenario '{}' already exists; choose a new aggregate name",
            spec.name
        )));
    }

    let source = resolve_source(records, spec.source.as_deref())?;

    let selected: Vec<&Record> = records.iter().filter(|r| spec.filter.selects(r)).collect();
    let mut selected_scenarios = first_appearance(selected.iter().map(|r| r.scenario.as_str()));
    if let ScenarioFilter::Whitelist(w) = &spec.filter {
        // Whitelist order, restricted to scenarios actually present
        selected_scenarios = first_appearance(
            w.iter()
                .map(String::as_str)
                .filter(|s| selected_scenarios.iter().any(|p| p == s)),
        );
    }
    if selected_scenarios.is_empty() {
        return Err(BenchError::Usage(format!(
            "no scenarios selected for aggregate '{}'",
            spec.name
        )));
    }

    // Coverage filter
    let threshold = spec.min_scenarios_present.min(selected_scenarios.len());
    let mut coverage: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in &selected {
        coverage.entry(r.model.as_str()).or_default().insert(r.scenario.as_str());
    }
    let mut models_excluded: Vec<String> = coverage
        .iter()
        .filter(|(_, scenarios)| scenarios.len() < threshold)
        .map(|(model, _)| model.to_string())
        .collect();
    models_excluded.sort();

    let rows: Vec<&Record> = selected
        .into_iter()
        .filter(|r| coverage[r.model.as_str()].len() >= threshold)
        .collect();

    let values: Vec<f64> = match spec.mode {
        AggregateMode::Mean => rows.iter().map(|r| r.score).collect(),
        AggregateMode::MeanWinRate => {
            let mut by_scenario: HashMap<&str, Vec<usize>> = HashMap::new();
            for (i, r) in rows.iter().enumerate() {
                by_scenario.entry(r.scenario.as_str()).or_default().push(i);
            }
            let mut wr = vec![0.0; rows.len()];
            for (scenario, idx) in &by_scenario {
                let scores: Vec<f64> = idx.iter().map(|&i| rows[i].score).collect();
                let rates = win_rates(&scores).map_err(|e| match e {
                    BenchError::Usage(msg) => BenchError::Usage(format!("scenario '{scenario}': {msg}")),
                    other => other,
                })?;
                for (&i, rate) in idx.iter().zip(rates) {
                    wr[i] = rate;
                }
            }
            wr
        }
    };

    let mut per_model: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (r, v) in rows.iter().zip(values) {
        let entry = per_model.entry(r.model.as_str()).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    let aggregated_from = match spec.aggregated_from {
        AggregatedFromPolicy::Selected => selected_scenarios.clone(),
        AggregatedFromPolicy::ExcludeBlacklisted => {
            let blacklist = spec.filter.blacklist();
            first_appearance(records.iter().map(|r| r.scenario.as_str()))
                .into_iter()
                .filter(|s| !blacklist.contains(s))
                .collect()
        }
    };

    let new_rows: Vec<Record> = per_model
        .into_iter()
        .map(|(model, (sum, n))| Record {
            model: model.to_string(),
            scenario: spec.name.clone(),
            score: sum / n as f64,
            source: source.clone(),
            aggregated_from: aggregated_from.clone(),
        })
        .collect();

    debug!(
        name = %spec.name,
        threshold,
        excluded = models_excluded.len(),
        "Coverage filter applied"
    );

    let summary = AggregateSummary {
        name: spec.name.clone(),
        mode: spec.mode,
        source,
        selected_scenarios,
        min_scenarios_applied: threshold,
        models_included: new_rows.len(),
        models_excluded,
    };
    Ok((new_rows, summary))
}

/// Append an aggregate scenario to the table.
pub fn add_aggregate(table: &mut DatasetTable, spec: &AggregateSpec) -> Result<AggregateSummary> {
    let (rows, summary) = compute_aggregate(table.records(), spec)?;
    table.extend(rows);
    info!(
        name = %summary.name,
        mode = %summary.mode,
        source = %summary.source,
        scenarios = summary.selected_scenarios.len(),
        models = summary.models_included,
        "Added aggregate scenario"
    );
    Ok(summary)
}
