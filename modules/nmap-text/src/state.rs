use portgrid_core::{PortId, Record};
use regex::Regex;
use std::sync::OnceLock;

fn scan_report_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Nmap scan report for (.+?)(?: \(([0-9A-Fa-f.:]+)\))?$").expect("scan report pattern"))
}

fn port_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 22/tcp open ssh OpenSSH 8.9p1
    // The service column is optional so that a bare `80/tcp open` row is kept
    // with an empty service instead of being dropped.
    RE.get_or_init(|| Regex::new(r"^([0-9]+)/(tcp|udp)\s+(\S+)(?:\s+(.*))?$").expect("port row pattern"))
}

/// What a single transcript line means, independent of parser state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    ScanReport { host: &'a str, ip: &'a str },
    TableHeader,
    TableEnd,
    PortRow { port: &'a str, proto: &'a str, state: &'a str, rest: &'a str },
    Other,
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(c) = scan_report_re().captures(line.trim_end()) {
        let host = c.get(1).map_or("", |m| m.as_str().trim());
        let ip = c.get(2).map_or("", |m| m.as_str());
        return LineKind::ScanReport { host, ip };
    }
    if line.starts_with("PORT") && line.contains("STATE") && line.contains("SERVICE") {
        return LineKind::TableHeader;
    }
    if line.is_empty() || line.starts_with("Nmap done:") || line.starts_with("MAC Address:") {
        return LineKind::TableEnd;
    }
    if let Some(c) = port_row_re().captures(line) {
        return LineKind::PortRow {
            port: c.get(1).map_or("", |m| m.as_str()),
            proto: c.get(2).map_or("", |m| m.as_str()),
            state: c.get(3).map_or("", |m| m.as_str()),
            rest: c.get(4).map_or("", |m| m.as_str()),
        };
    }
    LineKind::Other
}

/// Host named by the most recent "scan report" line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    pub host: String,
    pub ip: String,
}

impl HostContext {
    pub fn display_name(&self) -> &str {
        if self.host.is_empty() { &self.ip } else { &self.host }
    }
}

/// Per-host port table tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    OutsideTable(HostContext),
    InsideTable(HostContext),
}

impl Default for TableState {
    fn default() -> Self {
        TableState::OutsideTable(HostContext::default())
    }
}

impl TableState {
    pub fn is_inside(&self) -> bool {
        matches!(self, TableState::InsideTable(_))
    }

    /// Apply one classified line. Returns the next state and the record the
    /// line produced, if any.
    pub fn step(self, kind: &LineKind<'_>) -> (TableState, Option<Record>) {
        match (self, kind) {
            (_, LineKind::ScanReport { host, ip }) => {
                let ctx = HostContext { host: host.to_string(), ip: ip.to_string() };
                (TableState::OutsideTable(ctx), None)
            }
            (TableState::OutsideTable(ctx) | TableState::InsideTable(ctx), LineKind::TableHeader) => (TableState::InsideTable(ctx), None),
            (TableState::InsideTable(ctx), LineKind::TableEnd) => (TableState::OutsideTable(ctx), None),
            (TableState::InsideTable(ctx), LineKind::PortRow { port, proto, state, rest }) => {
                let record = port_record(&ctx, port, proto, state, rest);
                (TableState::InsideTable(ctx), Some(record))
            }
            (state, _) => (state, None),
        }
    }
}

fn port_record(ctx: &HostContext, port: &str, proto: &str, state: &str, rest: &str) -> Record {
    let rest = rest.trim();
    let (service, product) = match rest.split_once(char::is_whitespace) {
        Some((service, product)) => (service, product.trim()),
        None => (rest, ""),
    };
    Record {
        host: ctx.display_name().to_string(),
        ip: ctx.ip.clone(),
        proto: proto.to_string(),
        port: PortId::parse(port),
        state: state.to_string(),
        service: service.to_string(),
        product: product.to_string(),
        version: String::new(),
    }
}
