//! Local benchmark catalog: a directory of CSV result tables.
//!
//! Every `*.csv` file in the directory is one source; the file name is the
//! source name stamped on its records.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use benchtab_common::{BenchError, RawTable, Record, Result, RECORD_COLUMNS};
use tracing::{debug, info};

/// One catalog file, parsed but not yet ingested.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub source: String,
    pub table: RawTable,
}

/// Load every `*.csv` file in `dir`, sorted by file name.
pub fn load_catalog(dir: &Path) -> Result<Vec<CatalogEntry>> {
    if !dir.is_dir() {
        return Err(BenchError::Config(format!(
            "catalog directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(source) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let table = RawTable::from_csv_reader(File::open(&path)?)?;
        debug!(source = %source, rows = table.len(), columns = table.columns().len(), "Loaded catalog file");
        entries.push(CatalogEntry { source, table });
    }

    info!(dir = %dir.display(), files = entries.len(), "Loaded benchmark catalog");
    Ok(entries)
}

/// Write records as long-form CSV. `aggregated_from` is joined with `|`.
pub fn write_csv<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RECORD_COLUMNS)?;
    for r in records {
        let score = r.score.to_string();
        let aggregated_from = r.aggregated_from.join("|");
        wtr.write_record([
            r.model.as_str(),
            r.scenario.as_str(),
            score.as_str(),
            r.source.as_str(),
            aggregated_from.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
