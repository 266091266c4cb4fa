//! Shared fixtures for benchtab tests.

use std::collections::BTreeMap;

use benchtab_common::{RawTable, RawValue, Record};

pub use pretty_assertions;

/// Raw measured record.
pub fn record(model: &str, scenario: &str, score: f64, source: &str) -> Record {
    Record::new(model, scenario, score, source)
}

/// Wide table: `model` followed by one column per scenario.
pub fn wide_table(scenarios: &[&str], rows: Vec<(&str, Vec<RawValue>)>) -> RawTable {
    let mut header = vec!["model"];
    header.extend_from_slice(scenarios);
    let mut table = RawTable::new(header);
    for (model, cells) in rows {
        let mut row = vec![RawValue::from(model)];
        row.extend(cells);
        table.push_row(row).expect("fixture row width matches header");
    }
    table
}

/// Long table with `model, scenario, score` columns.
pub fn long_table(rows: &[(&str, &str, f64)]) -> RawTable {
    let mut table = RawTable::new(["model", "scenario", "score"]);
    for &(model, scenario, score) in rows {
        table
            .push_row(vec![model.into(), scenario.into(), score.into()])
            .expect("fixture row width matches header");
    }
    table
}

/// Scores of one scenario keyed by model.
pub fn scores_of(records: &[Record], scenario: &str) -> BTreeMap<String, f64> {
    records
        .iter()
        .filter(|r| r.scenario == scenario)
        .map(|r| (r.model.clone(), r.score))
        .collect()
}

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
