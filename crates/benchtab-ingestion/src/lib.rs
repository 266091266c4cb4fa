//! benchtab-ingestion — Getting raw benchmark tables into canonical shape.
//! Covers:
//! - Model and scenario name canonicalisation
//! - Schema validation and wide/long reshaping
//! - Lower-is-better orientation at ingest
//! - Resolution of scenarios reported by several sources
//! - CSV catalog loading and export

pub mod catalog;
pub mod dedup;
pub mod models;
pub mod normalise;
pub mod pipeline;

pub use catalog::{load_catalog, write_csv, CatalogEntry};
pub use dedup::{clear_repeated_scenarios, DedupReport, ScenarioResolution};
pub use models::{IngestContext, IngestOptions, IngestReport, IngestWarning};
pub use normalise::{NameNormaliser, NameRule, RuleSet};
pub use pipeline::ingest;
