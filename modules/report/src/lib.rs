//! Output artifacts built from parsed records: the canonical CSV table plus
//! the JSON envelope and plain-text summary.

mod json;
mod summary;
mod table;

pub use json::{write_json, ScanEnvelope};
pub use summary::{render_summary, write_summary};
pub use table::{row_order, sort_records, write_csv};

use portgrid_core::Record;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to encode JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

/// Create the parent directory of an output path if it is missing.
pub fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir { path: dir.to_path_buf(), source })
        }
        _ => Ok(()),
    }
}

/// Headline counts shared by the JSON and summary outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub records: usize,
    pub hosts: usize,
    pub open: usize,
}

impl Totals {
    pub fn of(records: &[Record]) -> Self {
        let hosts: BTreeSet<&str> = records.iter().map(|r| r.host.as_str()).collect();
        Totals { records: records.len(), hosts: hosts.len(), open: records.iter().filter(|r| r.is_open()).count() }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use portgrid_core::{PortId, Record};

    pub fn rec(host: &str, proto: &str, port: PortId, state: &str) -> Record {
        Record {
            host: host.into(),
            ip: String::new(),
            proto: proto.into(),
            port,
            state: state.into(),
            service: String::new(),
            product: String::new(),
            version: String::new(),
        }
    }
}
