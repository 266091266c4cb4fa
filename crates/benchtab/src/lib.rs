//! benchtab — Benchmark table normalisation and aggregation.
//!
//! The `Benchmark` session ties the workspace crates together: ingest raw
//! tables from many sources, reconcile names and duplicates, normalise
//! scores and derive aggregate rankings.

pub mod benchmark;
pub mod config;

pub use benchmark::Benchmark;
pub use config::Config;
