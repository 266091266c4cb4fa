//! End-to-end ingestion: raw CSV tables through canonicalisation, dedup and
//! aggregation.

use std::collections::HashSet;

use benchtab_common::{DisplayNameRegistry, LowerIsBetterRegistry, RawTable, Record};
use benchtab_db::DatasetTable;
use benchtab_ingestion::{
    clear_repeated_scenarios, ingest, load_catalog, write_csv, IngestContext, IngestOptions, IngestWarning,
    NameNormaliser,
};
use benchtab_ranker::{add_aggregate, AggregateMode, AggregateSpec};
use benchtab_test_utils::{assert_close, pretty_assertions::assert_eq, wide_table};

#[test]
fn test_wide_table_end_to_end() {
    let normaliser = NameNormaliser::default();
    let lower = LowerIsBetterRegistry::default();
    let ctx = IngestContext::new(&normaliser, &lower);

    let raw = wide_table(
        &["taskA", "taskB"],
        vec![
            ("m1", vec![10.0.into(), "-".into()]),
            ("m2", vec![20.0.into(), 5.0.into()]),
        ],
    );
    let mut table = DatasetTable::new();
    let report = ingest(&mut table, &raw, &IngestOptions::with_source("src"), &ctx).unwrap();

    assert_eq!(report.records_ingested, 3);
    assert_eq!(report.dropped_missing, 1);
    assert!(report.warnings.is_empty());
    assert_eq!(
        table.records(),
        &[
            Record::new("m1", "taska", 10.0, "src"),
            Record::new("m2", "taska", 20.0, "src"),
            Record::new("m2", "taskb", 5.0, "src"),
        ]
    );
    assert!(table.records().iter().all(|r| r.aggregated_from.is_empty()));
}

#[test]
fn test_double_ingest_is_not_double_counted() {
    let normaliser = NameNormaliser::default();
    let lower = LowerIsBetterRegistry::default();
    let ctx = IngestContext::new(&normaliser, &lower);
    let raw = RawTable::from_csv_str("model,MMLU,ARC\nGPT 4,0.8,0.9\nLlama 3 8B,0.6,-\n").unwrap();

    let mut table = DatasetTable::new();
    ingest(&mut table, &raw, &IngestOptions::with_source("s"), &ctx).unwrap();
    let after_first = table.records().to_vec();
    let report = ingest(&mut table, &raw, &IngestOptions::with_source("s"), &ctx).unwrap();

    let distinct: HashSet<(&str, &str)> = table
        .records()
        .iter()
        .map(|r| (r.model.as_str(), r.scenario.as_str()))
        .collect();
    assert_eq!(table.len(), distinct.len());
    assert_eq!(table.records(), after_first.as_slice());
    assert_eq!(report.warnings, vec![IngestWarning::DuplicatesResolved { dropped: 3 }]);
}

#[test]
fn test_catalog_to_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("helm.csv"),
        "Unnamed: 0,model,MMLU,GSM 8K,HSwag\n\
         0,meta-llama/Meta-Llama-3-8B,0.66,0.55,0.80\n\
         1,mistralai/Mistral-7B-v0.1,0.62,0.40,0.81\n\
         2,google/ul2,0.30,-,0.50\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("latency.csv"),
        "model,scenario,score\nLlama 3 8B,p50,120\nMistral 7B v0.1,p50,80\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("openllm.csv"),
        "model,mmlu,hellaswag\nllama3_8b,0.65,0.79\nflan_ul2,0.31,0.52\n",
    )
    .unwrap();

    let normaliser = NameNormaliser::new(DisplayNameRegistry::new([("mmlu", "MMLU")]));
    let lower = LowerIsBetterRegistry::from_text("# lower is better\nlatency\n");
    let ctx = IngestContext::new(&normaliser, &lower);

    let mut table = DatasetTable::new();
    for entry in load_catalog(dir.path()).unwrap() {
        ingest(&mut table, &entry.table, &IngestOptions::with_source(&entry.source), &ctx).unwrap();
    }

    assert_eq!(table.distinct_sources(), vec!["helm.csv", "latency.csv", "openllm.csv"]);
    assert!(table.distinct_models().contains(&"flan_ul2".to_string()));
    assert!(table.distinct_scenarios().contains(&"MMLU".to_string()));

    let latency = table.ranking("p50");
    assert_eq!(latency[0].model, "mistral_7b_v0_1");
    assert_close(latency[0].score, 1.0);

    // MMLU and hellaswag are reported by two sources; helm.csv overlaps more.
    let report = clear_repeated_scenarios(&mut table, None);
    assert_eq!(report.resolutions.len(), 2);
    assert!(report.resolutions.iter().all(|r| r.kept_source == "helm.csv"));

    let spec = AggregateSpec::new("helm_mwr", AggregateMode::MeanWinRate)
        .with_source("helm.csv")
        .with_min_scenarios_present(3);
    let summary = add_aggregate(&mut table, &spec).unwrap();
    assert_eq!(summary.models_excluded, vec!["flan_ul2".to_string()]);

    let mut out = Vec::new();
    write_csv(table.records(), &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    assert!(csv.lines().any(|l| l.starts_with("llama3_8b,helm_mwr,")));
}
