use crate::{ensure_parent, ReportError};
use portgrid_core::{Record, CSV_COLUMNS};
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Total row order: host, then proto, then numeric port (non-numeric as 0).
pub fn row_order(a: &Record, b: &Record) -> Ordering {
    a.host
        .cmp(&b.host)
        .then_with(|| a.proto.cmp(&b.proto))
        .then_with(|| a.port.sort_key().cmp(&b.port.sort_key()))
}

pub fn sort_records(records: &mut [Record]) {
    records.sort_by(row_order);
}

/// Write the header and all records in row order. Returns the number of data
/// rows written; zero records still produce a header-only file.
pub fn write_csv(records: &[Record], path: &Path) -> Result<usize, ReportError> {
    ensure_parent(path)?;
    let csv_err = |source: csv::Error| ReportError::Csv { path: path.to_path_buf(), source };
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| row_order(a, b));

    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(CSV_COLUMNS).map_err(csv_err)?;
    for r in &sorted {
        wtr.write_record(r.to_row()).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ReportError::Io { path: path.to_path_buf(), source })?;
    debug!(rows = sorted.len(), path = %path.display(), "csv written");
    Ok(sorted.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::rec;
    use portgrid_core::PortId;

    #[test]
    fn rows_sort_by_host_proto_then_numeric_port() {
        let mut rows = vec![
            rec("b", "tcp", PortId::Number(22), "open"),
            rec("a", "udp", PortId::Number(53), "open"),
            rec("a", "tcp", PortId::Number(443), "open"),
            rec("a", "tcp", PortId::Number(80), "open"),
            rec("a", "tcp", PortId::Raw("weird".into()), "open"),
            rec("a", "tcp", PortId::Number(9), "open"),
        ];
        sort_records(&mut rows);
        let order: Vec<String> = rows.iter().map(|r| format!("{}/{}/{}", r.host, r.proto, r.port)).collect();
        assert_eq!(order, ["a/tcp/weird", "a/tcp/9", "a/tcp/80", "a/tcp/443", "a/udp/53", "b/tcp/22"]);
    }

    #[test]
    fn sorted_output_is_totally_ordered() {
        let mut rows = vec![
            rec("host-2", "tcp", PortId::Number(8080), "open"),
            rec("host-10", "tcp", PortId::Number(22), "open"),
            rec("host-2", "tcp", PortId::Number(1000), "closed"),
            rec("host-1", "udp", PortId::Number(161), "open"),
        ];
        sort_records(&mut rows);
        assert!(rows.windows(2).all(|w| row_order(&w[0], &w[1]) != Ordering::Greater));
        // lexicographic, not natural, host order
        assert_eq!(rows[1].host, "host-10");
    }

    #[test]
    fn writes_header_and_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans/out.csv");
        let mut a = rec("web01", "tcp", PortId::Number(80), "open");
        a.ip = "10.0.0.5".into();
        a.service = "http".into();
        let mut b = rec("db01", "tcp", PortId::Number(5432), "open");
        b.product = "PostgreSQL DB 9.6, \"beta\"".into();
        let n = write_csv(&[a, b], &path).unwrap();
        assert_eq!(n, 2);
        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "host,ip,proto,port,state,service,product,version");
        assert_eq!(lines[1], "db01,,tcp,5432,open,,\"PostgreSQL DB 9.6, \"\"beta\"\"\",");
        assert_eq!(lines[2], "web01,10.0.0.5,tcp,80,open,http,,");
    }

    #[test]
    fn zero_records_write_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        assert_eq!(write_csv(&[], &path).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "host,ip,proto,port,state,service,product,version\n");
    }

    #[test]
    fn non_numeric_port_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        write_csv(&[rec("a", "ip", PortId::Raw("icmp".into()), "open")], &path).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.lines().nth(1).unwrap().starts_with("a,,ip,icmp,open"));
    }

    #[test]
    fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // parent exists as a file, so the directory cannot be created
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let err = write_csv(&[], &blocker.join("out.csv")).unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
    }
}
