use serde::Serialize;
use std::fmt;

/// Column order of the tabular output. Every record supplies all of them.
pub const CSV_COLUMNS: [&str; 8] = ["host", "ip", "proto", "port", "state", "service", "product", "version"];

/// Port identifier as reported by the scanner.
///
/// Purely numeric tokens become `Number`; anything else (including numbers too
/// large for a `u32`) is kept verbatim in `Raw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PortId {
    Number(u32),
    Raw(String),
}

impl PortId {
    pub fn parse(token: &str) -> Self {
        if is_ascii_numeric(token) {
            if let Ok(n) = token.parse::<u32>() {
                return PortId::Number(n);
            }
        }
        PortId::Raw(token.to_string())
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            PortId::Number(n) => Some(*n),
            PortId::Raw(_) => None,
        }
    }

    /// Key used for ordering rows. Non-numeric tokens sort as 0; the value
    /// itself is never rewritten.
    pub fn sort_key(&self) -> u64 {
        match self {
            PortId::Number(n) => u64::from(*n),
            PortId::Raw(s) if is_ascii_numeric(s) => s.parse::<u64>().unwrap_or(u64::MAX),
            PortId::Raw(_) => 0,
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Number(n) => write!(f, "{}", n),
            PortId::Raw(s) => f.write_str(s),
        }
    }
}

fn is_ascii_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// One normalized (host, port) observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub host: String,
    pub ip: String,
    pub proto: String,
    pub port: PortId,
    pub state: String,
    pub service: String,
    pub product: String,
    pub version: String,
}

impl Record {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }

    /// Field values in `CSV_COLUMNS` order.
    pub fn to_row(&self) -> [String; 8] {
        [
            self.host.clone(),
            self.ip.clone(),
            self.proto.clone(),
            self.port.to_string(),
            self.state.clone(),
            self.service.clone(),
            self.product.clone(),
            self.version.clone(),
        ]
    }
}
