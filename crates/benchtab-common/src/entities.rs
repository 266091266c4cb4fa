/// Core record type of the canonical long-form benchmark table.
/// One row = one measurement of one model on one scenario from one source.

use serde::{Deserialize, Serialize};

/// Names of the long-form columns, in export order.
pub const RECORD_COLUMNS: [&str; 5] = ["model", "scenario", "score", "source", "aggregated_from"];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub model: String,
    pub scenario: String,
    pub score: f64,
    pub source: String,
    /// Scenarios combined into this row; empty for measured rows.
    #[serde(default)]
    pub aggregated_from: Vec<String>,
}

impl Record {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        score: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
            score,
            source: source.into(),
            aggregated_from: Vec::new(),
        }
    }

    /// True for synthetic rows produced by an aggregate.
    pub fn is_aggregate(&self) -> bool {
        !self.aggregated_from.is_empty()
    }

    /// Uniqueness key of a row inside the table.
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            model: &self.model,
            scenario: &self.scenario,
            source: &self.source,
        }
    }
}

/// Borrowed `(model, scenario, source)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey<'a> {
    pub model: &'a str,
    pub scenario: &'a str,
    pub source: &'a str,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_aggregate() {
        let r = Record::new("m1", "task_a", 10.0, "src.csv");
        assert!(!r.is_aggregate());
        assert_eq!(r.key().model, "m1");
        assert_eq!(r.key().source, "src.csv");
    }

    #[test]
    fn test_aggregated_from_defaults_when_absent() {
        let json = r#"{"model":"m1","scenario":"s","score":0.5,"source":"x"}"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert!(r.aggregated_from.is_empty());
    }
}
