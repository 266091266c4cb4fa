//! Data models for the ingestion pipeline.

use std::fmt;

use benchtab_common::LowerIsBetterRegistry;
use serde::Serialize;

use crate::normalise::NameNormaliser;

/// Per-call ingestion options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Source name stamped on every row. Overrides a `source` column.
    pub source: Option<String>,
    /// Skip name canonicalisation.
    pub already_canonical: bool,
}

impl IngestOptions {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self { source: Some(source.into()), ..Self::default() }
    }

    pub fn canonical(mut self) -> Self {
        self.already_canonical = true;
        self
    }
}

/// Session-wide collaborators shared by every ingest call.
#[derive(Debug, Clone)]
pub struct IngestContext<'a> {
    pub normaliser: &'a NameNormaliser,
    pub lower_is_better: &'a LowerIsBetterRegistry,
    /// Cell texts treated as "no measurement".
    pub missing_markers: Vec<String>,
}

pub fn default_missing_markers() -> Vec<String> {
    vec!["-".to_string()]
}

impl<'a> IngestContext<'a> {
    pub fn new(normaliser: &'a NameNormaliser, lower_is_better: &'a LowerIsBetterRegistry) -> Self {
        Self {
            normaliser,
            lower_is_better,
            missing_markers: default_missing_markers(),
        }
    }

    pub fn with_missing_markers(mut self, markers: Vec<String>) -> Self {
        self.missing_markers = markers;
        self
    }

    pub fn is_missing_marker(&self, text: &str) -> bool {
        let text = text.trim();
        self.missing_markers.iter().any(|m| m == text)
    }
}

/// Recovered anomalies surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// Duplicate `(model, scenario, source)` rows collapsed to the best score.
    DuplicatesResolved { dropped: usize },
    /// Non-numeric wide-form cells dropped.
    NonNumericDropped { cells: usize },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestWarning::DuplicatesResolved { dropped } => write!(
                f,
                "Duplicate (model, scenario, source) entries found. Kept rows with the best scores ({dropped} dropped)"
            ),
            IngestWarning::NonNumericDropped { cells } => {
                write!(f, "{cells} non-numeric score cells dropped")
            }
        }
    }
}

/// Summary of one ingest call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub records_ingested: usize,
    pub dropped_missing: usize,
    pub dropped_non_numeric: usize,
    pub lower_is_better_applied: bool,
    pub warnings: Vec<IngestWarning>,
}
