//! Score normalisation functions.
//! Min-max rescaling within each scenario, with optional orientation flip.

use std::collections::HashMap;

use benchtab_common::{BenchError, RawTable, RawValue, Record, Result};
use benchtab_db::DatasetTable;

/// Min-max normalisation within a given range [min_val, max_val].
/// A range with no spread maps every value to 1.0.
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    if max_val == min_val {
        return 1.0;
    }
    (value - min_val) / (max_val - min_val)
}

/// Rescale `scores` in place, grouping by the parallel `groups` labels.
/// With `lower_is_better` the rescaled value is inverted (1 - s).
fn normalise_grouped(groups: &[&str], scores: &mut [f64], lower_is_better: bool) {
    let mut bounds: HashMap<&str, (f64, f64)> = HashMap::new();
    for (group, &score) in groups.iter().zip(scores.iter()) {
        let entry = bounds.entry(*group).or_insert((score, score));
        entry.0 = entry.0.min(score);
        entry.1 = entry.1.max(score);
    }

    for (group, score) in groups.iter().zip(scores.iter_mut()) {
        let (min_val, max_val) = bounds[*group];
        let normed = minmax_normalise(*score, min_val, max_val);
        *score = if lower_is_better { 1.0 - normed } else { normed };
    }
}

/// Normalise every record's score to [0, 1] within its scenario.
pub fn normalise_scores_per_scenario(records: &[Record], lower_is_better: bool) -> Vec<Record> {
    let groups: Vec<&str> = records.iter().map(|r| r.scenario.as_str()).collect();
    let mut scores: Vec<f64> = records.iter().map(|r| r.score).collect();
    normalise_grouped(&groups, &mut scores, lower_is_better);

    records
        .iter()
        .zip(scores)
        .map(|(r, score)| Record { score, ..r.clone() })
        .collect()
}

/// Normalise the whole table in place.
pub fn normalise_table(table: &mut DatasetTable, lower_is_better: bool) {
    let normed = normalise_scores_per_scenario(table.records(), lower_is_better);
    tracing::info!(
        rows = normed.len(),
        lower_is_better,
        "Normalised scores per scenario"
    );
    table.replace_records(normed);
}

/// Normalise the `score` column of a long-form raw table.
///
/// Rows whose score is not a finite number are left untouched and do not
/// contribute to the scenario bounds.
pub fn normalise_long_table(raw: &RawTable, lower_is_better: bool) -> Result<RawTable> {
    let score_idx = raw
        .column_index("score")
        .ok_or_else(|| BenchError::MissingColumn("table must contain a 'score' column".to_string()))?;
    let scenario_idx = raw
        .column_index("scenario")
        .ok_or_else(|| BenchError::MissingColumn("table must contain a 'scenario' column".to_string()))?;

    let numeric: Vec<(usize, String, f64)> = raw
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match (&row[score_idx], row[scenario_idx].as_label()) {
            (RawValue::Number(v), Some(scenario)) if v.is_finite() => Some((i, scenario, *v)),
            _ => None,
        })
        .collect();

    let groups: Vec<&str> = numeric.iter().map(|(_, s, _)| s.as_str()).collect();
    let mut scores: Vec<f64> = numeric.iter().map(|(_, _, v)| *v).collect();
    normalise_grouped(&groups, &mut scores, lower_is_better);

    let mut rows: Vec<Vec<RawValue>> = raw.rows().to_vec();
    for ((i, _, _), score) in numeric.iter().zip(scores) {
        rows[*i][score_idx] = RawValue::Number(score);
    }

    let mut out = RawTable::new(raw.columns().iter().cloned());
    for row in rows {
        out.push_row(row)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchtab_test_utils::{assert_close, long_table, record, scores_of};

    fn raw_records() -> Vec<Record> {
        vec![
            record("m1", "a", 10.0, "s"),
            record("m2", "a", 20.0, "s"),
            record("m3", "a", 15.0, "s"),
            record("m1", "b", 0.2, "s"),
            record("m2", "b", 0.4, "s"),
            record("m1", "flat", 3.0, "s"),
            record("m2", "flat", 3.0, "s"),
        ]
    }

    #[test]
    fn test_minmax_bounds_per_scenario() {
        let normed = normalise_scores_per_scenario(&raw_records(), false);
        for scenario in ["a", "b"] {
            let scores = scores_of(&normed, scenario);
            let min = scores.values().cloned().fold(f64::INFINITY, f64::min);
            let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_close(min, 0.0);
            assert_close(max, 1.0);
        }
        assert_close(scores_of(&normed, "a")["m3"], 0.5);
    }

    #[test]
    fn test_no_spread_maps_to_one() {
        let normed = normalise_scores_per_scenario(&raw_records(), false);
        assert!(scores_of(&normed, "flat").values().all(|&s| s == 1.0));
    }

    #[test]
    fn test_lower_is_better_inverts_pointwise() {
        let up = normalise_scores_per_scenario(&raw_records(), false);
        let down = normalise_scores_per_scenario(&raw_records(), true);
        for (u, d) in up.iter().zip(down.iter()) {
            assert_eq!(u.model, d.model);
            assert_close(d.score, 1.0 - u.score);
        }
    }

    #[test]
    fn test_normalise_table_replaces_rows() {
        let mut table = DatasetTable::from_records(raw_records());
        let v = table.version();
        normalise_table(&mut table, false);
        assert!(table.version() > v);
        assert!(table.records().iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }

    #[test]
    fn test_long_table_requires_score_column() {
        let raw = RawTable::new(["model", "scenario", "value"]);
        let err = normalise_long_table(&raw, false).unwrap_err();
        assert!(matches!(err, BenchError::MissingColumn(_)));
    }

    #[test]
    fn test_long_table_normalised() {
        let raw = long_table(&[("m1", "a", 1.0), ("m2", "a", 3.0), ("m3", "a", 2.0)]);
        let out = normalise_long_table(&raw, false).unwrap();
        let scores: Vec<RawValue> = out.rows().iter().map(|r| r[2].clone()).collect();
        assert_eq!(
            scores,
            vec![RawValue::Number(0.0), RawValue::Number(1.0), RawValue::Number(0.5)]
        );
    }
}
