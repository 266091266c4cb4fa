//! benchtab-common — Shared types, errors, and registries used across all benchtab crates.

pub mod error;
pub mod entities;
pub mod raw;
pub mod registry;

// Re-export commonly used types
pub use entities::{Record, RecordKey, RECORD_COLUMNS};
pub use error::{BenchError, Result};
pub use raw::{RawTable, RawValue};
pub use registry::{DisplayNameRegistry, LowerIsBetterRegistry};
