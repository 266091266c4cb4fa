//! Name normalisation pipeline.
//!
//! `NameNormaliser` maps raw model and scenario labels from heterogeneous
//! sources onto one canonical vocabulary, driven by ordered rule sets.

pub mod names;

pub use names::{NameNormaliser, NameRule, RuleSet};
