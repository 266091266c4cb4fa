//! benchtab in-memory table layer
//!
//! This crate owns the canonical long-form benchmark table that every other
//! stage reads from and writes back to.
//!
//! # Features
//!
//! - Owned, versioned table with cheap immutable snapshots
//! - `(model, scenario, source)` uniqueness enforced on every merge
//! - Read-only coverage statistics and rankings
//! - Scenario co-occurrence matrix over shared models
//!
//! # Example
//!
//! ```rust
//! use benchtab_common::Record;
//! use benchtab_db::DatasetTable;
//!
//! let mut table = DatasetTable::new();
//! table.extend(vec![
//!     Record::new("llama3_8b", "mmlu", 0.61, "leaderboard.csv"),
//!     Record::new("mistral_7b", "mmlu", 0.58, "leaderboard.csv"),
//! ]);
//! assert_eq!(table.distinct_models().len(), 2);
//! ```

pub mod overlap;
pub mod table;

pub use overlap::CoOccurrence;
pub use table::{collapse_duplicates, DatasetTable, TableSnapshot};
