//! Nmap "normal" output (`-oN` or captured stdout) reader.
//!
//! Transcripts are not a formal contract, so this parser never fails on line
//! content: anything it cannot classify is skipped and parsing continues.

mod state;

pub use state::{classify_line, HostContext, LineKind, TableState};

use portgrid_core::Record;
use std::path::Path;
use tracing::debug;

/// Read a transcript from disk. Only I/O failures are errors; invalid UTF-8 is
/// replaced rather than rejected.
pub fn parse_file(path: &Path) -> std::io::Result<Vec<Record>> {
    let bytes = std::fs::read(path)?;
    Ok(parse_str(&String::from_utf8_lossy(&bytes)))
}

/// Parse a transcript held in memory.
pub fn parse_str(text: &str) -> Vec<Record> {
    let mut state = TableState::default();
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let kind = classify_line(line);
        let (next, record) = state.step(&kind);
        if let Some(r) = record {
            rows.push(r);
        } else if next.is_inside() && matches!(kind, LineKind::Other) {
            debug!(line = lineno + 1, "ignoring unrecognized line inside port table");
        }
        state = next;
    }
    rows
}
