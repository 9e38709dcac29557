use crate::{ensure_parent, row_order, ReportError, Totals};
use portgrid_core::Record;
use std::collections::BTreeMap;
use std::path::Path;

const WIDTH: usize = 70;

/// Human-readable report: headline counts, then each host's open ports.
pub fn render_summary(records: &[Record], source: &str, scan_timestamp: &str) -> String {
    let totals = Totals::of(records);
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);

    let mut by_host: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for r in records {
        by_host.entry(r.host.as_str()).or_default().push(r);
    }

    let mut lines = vec![
        heavy.clone(),
        "Nmap Scan Summary".to_string(),
        heavy.clone(),
        format!("Scan Date: {scan_timestamp}"),
        format!("Source: {source}"),
        format!("Total Records: {}", totals.records),
        format!("Hosts: {}", totals.hosts),
        format!("Open Ports: {}", totals.open),
        String::new(),
    ];

    for (host, mut rows) in by_host {
        rows.sort_by(|a, b| row_order(a, b));
        lines.push(light.clone());
        match rows.iter().map(|r| r.ip.as_str()).find(|ip| !ip.is_empty() && *ip != host) {
            Some(ip) => lines.push(format!("{host} ({ip})")),
            None => lines.push(host.to_string()),
        }
        lines.push(light.clone());
        let before = lines.len();
        for r in rows.iter().filter(|r| r.is_open()) {
            let detail = [r.service.as_str(), r.product.as_str(), r.version.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("  - {}/{} {}", r.port, r.proto, detail).trim_end().to_string());
        }
        if lines.len() == before {
            lines.push("  (no open ports)".to_string());
        }
        lines.push(String::new());
    }
    lines.push(heavy);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn write_summary(records: &[Record], source: &str, scan_timestamp: &str, path: &Path) -> Result<(), ReportError> {
    ensure_parent(path)?;
    std::fs::write(path, render_summary(records, source, scan_timestamp))
        .map_err(|e| ReportError::Io { path: path.to_path_buf(), source: e })
}
