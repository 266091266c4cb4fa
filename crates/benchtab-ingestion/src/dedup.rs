//! Resolution of scenarios reported by more than one source.
//!
//! When several sources publish the same scenario, only one realisation is
//! kept. Each `scenario__source` combination is scored by its popularity:
//! the row sum of the co-occurrence matrix `C = X · Xᵀ` over models, i.e.
//! how many models it shares with every other combination (itself included).
//! A preferred source wins outright when it is among the candidates.

use std::collections::{HashMap, HashSet};

use benchtab_db::{CoOccurrence, DatasetTable};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome for one contested scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResolution {
    pub scenario: String,
    pub kept_source: String,
    pub dropped_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupReport {
    pub resolutions: Vec<ScenarioResolution>,
    pub rows_removed: usize,
}

impl DedupReport {
    pub fn is_empty(&self) -> bool {
        self.resolutions.is_empty()
    }
}

fn combination_key(scenario: &str, source: &str) -> String {
    format!("{scenario}__{source}")
}

/// Pick one source per contested scenario and drop the rest.
pub fn clear_repeated_scenarios(table: &mut DatasetTable, preferred_source: Option<&str>) -> DedupReport {
    let overlap = CoOccurrence::from_pairs(
        table
            .records()
            .iter()
            .map(|r| (combination_key(&r.scenario, &r.source), r.model.as_str())),
    );

    // scenario → sources in first-appearance order
    let mut scenario_order: Vec<&str> = Vec::new();
    let mut candidates: HashMap<&str, Vec<&str>> = HashMap::new();
    for r in table.records() {
        let sources = candidates.entry(r.scenario.as_str()).or_insert_with(|| {
            scenario_order.push(r.scenario.as_str());
            Vec::new()
        });
        if !sources.contains(&r.source.as_str()) {
            sources.push(r.source.as_str());
        }
    }

    let mut resolutions = Vec::new();
    for scenario in scenario_order {
        let sources = &candidates[scenario];
        if sources.len() < 2 {
            continue;
        }

        let kept = match preferred_source.filter(|p| sources.contains(p)) {
            Some(p) => p,
            None => {
                let mut best = sources[0];
                let mut best_pop = 0;
                for (i, &source) in sources.iter().enumerate() {
                    let pop = overlap
                        .row_sum(&combination_key(scenario, source))
                        .unwrap_or(0);
                    debug!(scenario, source, popularity = pop, "Candidate source");
                    if i == 0 || pop > best_pop {
                        best = source;
                        best_pop = pop;
                    }
                }
                best
            }
        };

        resolutions.push(ScenarioResolution {
            scenario: scenario.to_string(),
            kept_source: kept.to_string(),
            dropped_sources: sources
                .iter()
                .filter(|s| **s != kept)
                .map(|s| s.to_string())
                .collect(),
        });
    }

    let dropped: HashSet<(String, String)> = resolutions
        .iter()
        .flat_map(|res| {
            res.dropped_sources
                .iter()
                .map(move |s| (res.scenario.clone(), s.clone()))
        })
        .collect();

    let rows_removed = if dropped.is_empty() {
        0
    } else {
        table.retain(|r| !dropped.contains(&(r.scenario.clone(), r.source.clone())))
    };

    for res in &resolutions {
        info!(
            scenario = %res.scenario,
            kept = %res.kept_source,
            dropped = ?res.dropped_sources,
            "Resolved scenario reported by several sources"
        );
    }

    DedupReport { resolutions, rows_removed }
}
