//! Static lookup registries consulted during ingestion.
//!
//! Both registries are built once at startup and passed explicitly to the
//! components that need them:
//! - `LowerIsBetterRegistry`: sources whose raw metric improves downwards
//! - `DisplayNameRegistry`: canonical scenario key → display name

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::Result;

// ── Lower-is-better ───────────────────────────────────────────────────────────

/// Set of benchmark sources whose scores are inverted-is-better.
#[derive(Debug, Clone, Default)]
pub struct LowerIsBetterRegistry {
    sources: HashSet<String>,
}

impl LowerIsBetterRegistry {
    pub fn new<S: Into<String>>(sources: impl IntoIterator<Item = S>) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    /// One benchmark name per line. Blank lines and `#` comments are skipped.
    pub fn from_text(text: &str) -> Self {
        let sources = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect::<HashSet<_>>();
        tracing::debug!(n = sources.len(), "Lower-is-better registry loaded");
        Self { sources }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// Matches the source name itself or its file stem (`"x.csv"` ↔ `"x"`).
    pub fn is_lower_better(&self, source: &str) -> bool {
        if self.sources.contains(source) {
            return true;
        }
        Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| self.sources.contains(stem))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ── Display names ─────────────────────────────────────────────────────────────

/// Mapping from canonical scenario key to its display name.
#[derive(Debug, Clone, Default)]
pub struct DisplayNameRegistry {
    names: HashMap<String, String>,
    /// Reverse index so that display names are recognised as already canonical.
    display_values: HashSet<String>,
}

impl DisplayNameRegistry {
    pub fn new<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let names: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let display_values = names.values().cloned().collect();
        Self { names, display_values }
    }

    /// Build from a JSON object of `"key": "Display Name"` pairs.
    pub fn from_json(json: &str) -> Result<Self> {
        let names: HashMap<String, String> = serde_json::from_str(json)?;
        tracing::debug!(n = names.len(), "Display-name registry loaded");
        Ok(Self::new(names))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// True if `name` is one of the registered display names.
    pub fn is_display_name(&self, name: &str) -> bool {
        self.display_values.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
