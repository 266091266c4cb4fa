//! Raw benchmark tables as they arrive from a source, before validation.
//!
//! A raw table is either wide (`model` + one column per scenario) or long
//! (`model`, `scenario`, `score`). Cells keep their original shape so that
//! ingestion can tell missing markers apart from real values.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// One cell of a raw table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Parse a textual cell: empty → `Missing`, float → `Number`, else `Text`.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => RawValue::Number(v),
            Err(_) => RawValue::Text(cell.to_string()),
        }
    }

    /// Render as a label (model or scenario name). `None` for missing cells.
    pub fn as_label(&self) -> Option<String> {
        match self {
            RawValue::Number(v) => Some(v.to_string()),
            RawValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawValue::Missing, RawValue::Number)
    }
}

/// Column-named grid of raw cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Its width must match the header.
    pub fn push_row(&mut self, row: Vec<RawValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(BenchError::Schema(format!(
                "row {} has {} cells, header has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: Vec<RawValue>) -> Result<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Parse a headed CSV document.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>();
        let mut table = RawTable::new(headers);

        for result in reader.records() {
            let record = result?;
            let row = record.iter().map(RawValue::parse).collect();
            table.push_row(row)?;
        }

        tracing::debug!(
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Parsed raw CSV table"
        );
        Ok(table)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells() {
        assert_eq!(RawValue::parse("10"), RawValue::Number(10.0));
        assert_eq!(RawValue::parse(" 0.25 "), RawValue::Number(0.25));
        assert_eq!(RawValue::parse(""), RawValue::Missing);
        assert_eq!(RawValue::parse("-"), RawValue::Text("-".to_string()));
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut t = RawTable::new(["model", "a"]);
        assert!(t.push_row(vec!["m1".into()]).is_err());
        assert!(t.push_row(vec!["m1".into(), 1.0.into()]).is_ok());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_from_csv_str_wide() {
        let t = RawTable::from_csv_str("model,taskA,taskB\nm1,10,-\nm2,20,5\n").unwrap();
        assert_eq!(t.columns(), &["model", "taskA", "taskB"]);
        assert_eq!(t.rows()[0][2], RawValue::Text("-".to_string()));
        assert_eq!(t.rows()[1][2], RawValue::Number(5.0));
    }

    #[test]
    fn test_from_csv_str_ragged_rows_fail() {
        assert!(RawTable::from_csv_str("model,a\nm1,1,2\n").is_err());
    }

    #[test]
    fn test_numeric_label() {
        assert_eq!(RawValue::Number(7.0).as_label().as_deref(), Some("7"));
        assert_eq!(RawValue::Missing.as_label(), None);
        assert_eq!(RawValue::Text("  ".into()).as_label(), None);
    }
}
