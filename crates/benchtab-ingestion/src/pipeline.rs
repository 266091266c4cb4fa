//! Ingestion and validation of raw benchmark tables.
//!
//! Accepts either shape a source publishes:
//!   - long form: `model, scenario, score[, source]`, one row per measurement
//!   - wide form: `model` followed by one column per scenario
//!
//! and merges the canonical records into a `DatasetTable`:
//!   1. Drop row-index artifacts and the `tag` column
//!   2. Validate the column set
//!   3. Reshape to records, dropping missing and non-numeric cells
//!   4. Canonicalise model and scenario names
//!   5. Collapse duplicate `(model, scenario, source)` rows to the best score
//!   6. Orient lower-is-better sources via per-scenario normalisation
//!   7. Merge into the table
//!
//! Nothing touches the table until every check has passed.

use std::collections::HashMap;

use benchtab_common::{BenchError, RawTable, RawValue, Record, Result};
use benchtab_db::{collapse_duplicates, DatasetTable};
use benchtab_ranker::normalise_scores_per_scenario;
use tracing::{debug, info, instrument, warn};

use crate::models::{IngestContext, IngestOptions, IngestReport, IngestWarning};

const INDEX_ARTIFACT: &str = "Unnamed: 0";
const LONG_FORM_COLUMNS: [&str; 4] = ["model", "scenario", "score", "source"];

// ── Column layout ─────────────────────────────────────────────────────────────

/// Column indices of a validated raw table.
#[derive(Debug)]
enum Layout {
    Long {
        model: usize,
        scenario: usize,
        score: usize,
        source: Option<usize>,
    },
    Wide {
        model: usize,
        source: Option<usize>,
        scenarios: Vec<(usize, String)>,
    },
}

fn resolve_layout(raw: &RawTable) -> Result<Layout> {
    let columns: Vec<(usize, &str)> = raw
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.trim()))
        .filter(|(_, c)| !c.is_empty() && *c != INDEX_ARTIFACT && *c != "tag")
        .collect();

    match columns.first() {
        Some((_, "model")) => {}
        Some((_, other)) => {
            return Err(BenchError::Schema(format!(
                "first column must be 'model', found '{other}'"
            )))
        }
        None => return Err(BenchError::Schema("table has no columns".to_string())),
    }

    let find = |name: &str| columns.iter().find(|(_, c)| *c == name).map(|(i, _)| *i);
    let model = columns[0].0;
    let source = find("source");

    if let Some(scenario) = find("scenario") {
        let score = find("score").ok_or_else(|| {
            BenchError::Schema("long-form table has a 'scenario' column but no 'score' column".to_string())
        })?;
        let unexpected: Vec<&str> = columns
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| !LONG_FORM_COLUMNS.contains(c))
            .collect();
        if !unexpected.is_empty() {
            return Err(BenchError::Schema(format!(
                "unexpected columns in long-form table: {}",
                unexpected.join(", ")
            )));
        }
        return Ok(Layout::Long { model, scenario, score, source });
    }

    let scenarios: Vec<(usize, String)> = columns
        .iter()
        .skip(1)
        .filter(|(_, c)| *c != "source")
        .map(|(i, c)| (*i, c.to_string()))
        .collect();
    if scenarios.is_empty() {
        return Err(BenchError::Schema(
            "wide-form table needs at least one scenario column besides 'model'".to_string(),
        ));
    }
    Ok(Layout::Wide { model, source, scenarios })
}

// ── Cell handling ─────────────────────────────────────────────────────────────

enum Cell {
    Score(f64),
    Missing,
    NonNumeric(String),
}

fn classify(value: &RawValue, ctx: &IngestContext<'_>) -> Cell {
    match value {
        RawValue::Number(v) if v.is_finite() => Cell::Score(*v),
        RawValue::Number(_) | RawValue::Missing => Cell::Missing,
        RawValue::Text(t) if t.trim().is_empty() || ctx.is_missing_marker(t) => Cell::Missing,
        RawValue::Text(t) => Cell::NonNumeric(t.clone()),
    }
}

#[derive(Default)]
struct Counts {
    dropped_missing: usize,
    dropped_non_numeric: usize,
}

struct Namer<'a, 'c> {
    ctx: &'a IngestContext<'c>,
    canonical: bool,
}

impl Namer<'_, '_> {
    fn model(&self, raw: &str) -> String {
        if self.canonical {
            raw.trim().to_string()
        } else {
            self.ctx.normaliser.canonicalize_model(raw)
        }
    }

    fn scenario(&self, raw: &str) -> String {
        if self.canonical {
            raw.trim().to_string()
        } else {
            self.ctx.normaliser.canonicalize_scenario(raw)
        }
    }
}

fn row_source(row: &[RawValue], column: Option<usize>, explicit: Option<&str>, line: usize) -> Result<String> {
    if let Some(source) = explicit {
        return Ok(source.to_string());
    }
    column
        .and_then(|i| row[i].as_label())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| BenchError::Schema(format!("row {line} has no source and no source name was given")))
}

fn reshape(
    raw: &RawTable,
    layout: &Layout,
    options: &IngestOptions,
    ctx: &IngestContext<'_>,
    counts: &mut Counts,
) -> Result<Vec<Record>> {
    let namer = Namer { ctx, canonical: options.already_canonical };
    let explicit = options.source.as_deref();
    let mut batch = Vec::new();

    match layout {
        Layout::Long { model, scenario, score, source } => {
            for (line, row) in raw.rows().iter().enumerate() {
                let (Some(m), Some(s)) = (row[*model].as_label(), row[*scenario].as_label()) else {
                    counts.dropped_missing += 1;
                    continue;
                };
                let value = match classify(&row[*score], ctx) {
                    Cell::Score(v) => v,
                    Cell::Missing => {
                        counts.dropped_missing += 1;
                        continue;
                    }
                    Cell::NonNumeric(text) => {
                        return Err(BenchError::NumericType(format!(
                            "score column must be numeric, found '{text}' for model '{m}' in scenario '{s}'"
                        )))
                    }
                };
                let src = row_source(row, *source, explicit, line)?;
                batch.push(Record::new(namer.model(&m), namer.scenario(&s), value, src));
            }
        }
        Layout::Wide { model, source, scenarios } => {
            let names: Vec<(usize, String)> = scenarios
                .iter()
                .map(|(i, s)| (*i, namer.scenario(s)))
                .collect();
            for (line, row) in raw.rows().iter().enumerate() {
                let Some(m) = row[*model].as_label() else {
                    counts.dropped_missing += names.len();
                    continue;
                };
                let canonical_model = namer.model(&m);
                let src = row_source(row, *source, explicit, line)?;
                for (i, scenario) in &names {
                    match classify(&row[*i], ctx) {
                        Cell::Score(v) => batch.push(Record::new(
                            canonical_model.clone(),
                            scenario.clone(),
                            v,
                            src.clone(),
                        )),
                        Cell::Missing => counts.dropped_missing += 1,
                        Cell::NonNumeric(text) => {
                            debug!(model = %m, scenario = %scenario, cell = %text, "Dropping non-numeric cell");
                            counts.dropped_non_numeric += 1;
                        }
                    }
                }
            }
        }
    }
    Ok(batch)
}

/// Normalise the rows of every lower-is-better source, one source at a time.
fn orient_lower_is_better(batch: Vec<Record>, ctx: &IngestContext<'_>) -> (Vec<Record>, bool) {
    let mut groups: Vec<(String, Vec<Record>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in batch {
        let slot = *index.entry(record.source.clone()).or_insert_with(|| {
            groups.push((record.source.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    let mut applied = false;
    let mut out = Vec::new();
    for (source, records) in groups {
        if ctx.lower_is_better.is_lower_better(&source) {
            debug!(source = %source, rows = records.len(), "Normalising lower-is-better source");
            out.extend(normalise_scores_per_scenario(&records, true));
            applied = true;
        } else {
            out.extend(records);
        }
    }
    (out, applied)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Validate `raw`, turn it into canonical records and merge them into `table`.
#[instrument(skip(table, raw, ctx), fields(rows = raw.len()))]
pub fn ingest(
    table: &mut DatasetTable,
    raw: &RawTable,
    options: &IngestOptions,
    ctx: &IngestContext<'_>,
) -> Result<IngestReport> {
    let layout = resolve_layout(raw)?;
    let has_source_column = match &layout {
        Layout::Long { source, .. } | Layout::Wide { source, .. } => source.is_some(),
    };
    if options.source.is_none() && !has_source_column {
        return Err(BenchError::Schema(
            "no source name given and the table has no 'source' column".to_string(),
        ));
    }
    debug!(layout = ?layout, "Resolved table layout");

    let mut counts = Counts::default();
    let batch = reshape(raw, &layout, options, ctx, &mut counts)?;

    let mut warnings = Vec::new();
    let (batch, collapsed) = collapse_duplicates(batch);
    if counts.dropped_non_numeric > 0 {
        warn!(cells = counts.dropped_non_numeric, "Non-numeric score cells dropped");
        warnings.push(IngestWarning::NonNumericDropped { cells: counts.dropped_non_numeric });
    }

    let (batch, lower_is_better_applied) = orient_lower_is_better(batch, ctx);

    let mut sources: Vec<String> = Vec::new();
    for r in &batch {
        if !sources.contains(&r.source) {
            sources.push(r.source.clone());
        }
    }
    let source = options.source.clone().unwrap_or_else(|| sources.join(", "));

    let records_ingested = batch.len();
    let merged = table.extend(batch);
    let duplicates = collapsed + merged;
    if duplicates > 0 {
        warn!(
            source = %source,
            dropped = duplicates,
            "Duplicate (model, scenario, source) entries found. Keeping rows with the best scores."
        );
        warnings.push(IngestWarning::DuplicatesResolved { dropped: duplicates });
    }

    info!(
        source = %source,
        records = records_ingested,
        dropped_missing = counts.dropped_missing,
        dropped_non_numeric = counts.dropped_non_numeric,
        lower_is_better = lower_is_better_applied,
        "Ingested benchmark table"
    );

    Ok(IngestReport {
        source,
        records_ingested,
        dropped_missing: counts.dropped_missing,
        dropped_non_numeric: counts.dropped_non_numeric,
        lower_is_better_applied,
        warnings,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalise::NameNormaliser;
    use benchtab_common::{DisplayNameRegistry, LowerIsBetterRegistry};
    use benchtab_test_utils::{assert_close, long_table, scores_of, wide_table};

    struct Fixture {
        normaliser: NameNormaliser,
        lower: LowerIsBetterRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                normaliser: NameNormaliser::new(DisplayNameRegistry::default()),
                lower: LowerIsBetterRegistry::new(["latency"]),
            }
        }

        fn ctx(&self) -> IngestContext<'_> {
            IngestContext::new(&self.normaliser, &self.lower)
        }
    }

    #[test]
    fn test_first_column_must_be_model() {
        let f = Fixture::new();
        let raw = RawTable::new(["name", "mmlu"]);
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::Schema(_)));
    }

    #[test]
    fn test_index_artifact_and_tag_are_dropped() {
        let f = Fixture::new();
        let raw = RawTable::new(["Unnamed: 0", "model", "tag", "MMLU"])
            .with_row(vec![0.0.into(), "GPT 4".into(), "chat".into(), 0.8.into()])
            .unwrap();
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap();
        assert_eq!(report.records_ingested, 1);
        assert_eq!(table.records()[0].model, "gpt_4");
        assert_eq!(table.records()[0].scenario, "mmlu");
    }

    #[test]
    fn test_long_form_requires_score() {
        let f = Fixture::new();
        let raw = RawTable::new(["model", "scenario", "value"]);
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::Schema(_)));
    }

    #[test]
    fn test_long_form_rejects_extra_columns() {
        let f = Fixture::new();
        let raw = RawTable::new(["model", "scenario", "score", "notes"]);
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::Schema(msg) if msg.contains("notes")));
    }

    #[test]
    fn test_wide_form_without_scenarios() {
        let f = Fixture::new();
        let raw = RawTable::new(["model"]);
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::Schema(_)));
    }

    #[test]
    fn test_source_is_required() {
        let f = Fixture::new();
        let raw = long_table(&[("m", "a", 1.0)]);
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::default(), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::Schema(_)));
    }

    #[test]
    fn test_long_form_source_column() {
        let f = Fixture::new();
        let raw = RawTable::new(["model", "scenario", "score", "source"])
            .with_row(vec!["m1".into(), "a".into(), 0.5.into(), "x.csv".into()])
            .unwrap()
            .with_row(vec!["m1".into(), "a".into(), 0.7.into(), "y.csv".into()])
            .unwrap();
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::default(), &f.ctx()).unwrap();
        assert_eq!(report.source, "x.csv, y.csv");
        assert_eq!(table.distinct_sources(), vec!["x.csv", "y.csv"]);
    }

    #[test]
    fn test_long_form_non_numeric_score_is_error_and_atomic() {
        let f = Fixture::new();
        let raw = RawTable::new(["model", "scenario", "score"])
            .with_row(vec!["m1".into(), "a".into(), 0.5.into()])
            .unwrap()
            .with_row(vec!["m2".into(), "a".into(), "n/a".into()])
            .unwrap();
        let mut table = DatasetTable::new();
        let err = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap_err();
        assert!(matches!(err, BenchError::NumericType(_)));
        assert!(table.is_empty());
        assert_eq!(table.version(), 0);
    }

    #[test]
    fn test_wide_form_drops_missing_and_non_numeric() {
        let f = Fixture::new();
        let raw = wide_table(
            &["a", "b", "c"],
            vec![
                ("m1", vec![0.5.into(), "-".into(), RawValue::Missing]),
                ("m2", vec!["oops".into(), 0.2.into(), f64::NAN.into()]),
            ],
        );
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap();
        assert_eq!(report.records_ingested, 2);
        assert_eq!(report.dropped_missing, 3);
        assert_eq!(report.dropped_non_numeric, 1);
        assert_eq!(report.warnings, vec![IngestWarning::NonNumericDropped { cells: 1 }]);
        assert!(table.records().iter().all(|r| r.score.is_finite()));
    }

    #[test]
    fn test_custom_missing_markers() {
        let f = Fixture::new();
        let ctx = f.ctx().with_missing_markers(vec!["N/A".to_string()]);
        let raw = wide_table(&["a"], vec![("m1", vec!["N/A".into()]), ("m2", vec![0.1.into()])]);
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &ctx).unwrap();
        assert_eq!(report.dropped_missing, 1);
        assert_eq!(report.dropped_non_numeric, 0);
    }

    #[test]
    fn test_duplicates_collapse_to_max() {
        let f = Fixture::new();
        let raw = long_table(&[("Model A", "x", 0.3), ("model-a", "x", 0.9), ("model_a", "x", 0.5)]);
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &f.ctx()).unwrap();
        assert_eq!(table.len(), 1);
        assert_close(table.records()[0].score, 0.9);
        assert_eq!(report.warnings, vec![IngestWarning::DuplicatesResolved { dropped: 2 }]);
    }

    #[test]
    fn test_already_canonical_skips_rules() {
        let f = Fixture::new();
        let raw = long_table(&[("Model-A", "GSM 8K", 0.3)]);
        let mut table = DatasetTable::new();
        ingest(&mut table, &raw, &IngestOptions::with_source("s").canonical(), &f.ctx()).unwrap();
        assert_eq!(table.records()[0].model, "Model-A");
        assert_eq!(table.records()[0].scenario, "GSM 8K");
    }

    #[test]
    fn test_lower_is_better_source_is_oriented() {
        let f = Fixture::new();
        let raw = long_table(&[("fast", "p50", 10.0), ("slow", "p50", 30.0), ("mid", "p50", 20.0)]);
        let mut table = DatasetTable::new();
        let report = ingest(&mut table, &raw, &IngestOptions::with_source("latency.csv"), &f.ctx()).unwrap();
        assert!(report.lower_is_better_applied);
        let scores = scores_of(table.records(), "p50");
        assert_close(scores["fast"], 1.0);
        assert_close(scores["mid"], 0.5);
        assert_close(scores["slow"], 0.0);
    }
}
