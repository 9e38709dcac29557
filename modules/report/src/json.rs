use crate::{ensure_parent, row_order, ReportError, Totals};
use portgrid_core::Record;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON document wrapping the records with run metadata and headline counts.
#[derive(Debug, Serialize)]
pub struct ScanEnvelope<'a> {
    pub scan_timestamp: String,
    pub source: String,
    pub total_records: usize,
    pub host_count: usize,
    pub open_count: usize,
    pub records: Vec<&'a Record>,
}

impl<'a> ScanEnvelope<'a> {
    pub fn new(records: &'a [Record], source: &str, scan_timestamp: String) -> Self {
        let totals = Totals::of(records);
        let mut sorted: Vec<&Record> = records.iter().collect();
        sorted.sort_by(|a, b| row_order(a, b));
        ScanEnvelope {
            scan_timestamp,
            source: source.to_string(),
            total_records: totals.records,
            host_count: totals.hosts,
            open_count: totals.open,
            records: sorted,
        }
    }
}

pub fn write_json(envelope: &ScanEnvelope<'_>, path: &Path) -> Result<(), ReportError> {
    ensure_parent(path)?;
    let io_err = |source: std::io::Error| ReportError::Io { path: path.to_path_buf(), source };
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, envelope).map_err(|source| ReportError::Json { path: path.to_path_buf(), source })?;
    writeln!(w).map_err(io_err)?;
    w.flush().map_err(io_err)?;
    Ok(())
}
