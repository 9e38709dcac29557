use portgrid_core::Record;
use std::collections::BTreeSet;

/// Boolean grid of hosts (rows) by numeric ports (columns). A cell is set when
/// some record for that host and port has state `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPortMatrix {
    hosts: Vec<String>,
    ports: Vec<u32>,
    cells: Vec<bool>,
}

impl OpenPortMatrix {
    pub fn from_records(records: &[Record]) -> Self {
        let hosts: Vec<String> = records.iter().map(|r| r.host.clone()).collect::<BTreeSet<_>>().into_iter().collect();
        // non-numeric ports have no place on an ordered axis
        let ports: Vec<u32> = records.iter().filter_map(|r| r.port.number()).collect::<BTreeSet<_>>().into_iter().collect();
        let mut cells = vec![false; hosts.len() * ports.len()];
        for r in records.iter().filter(|r| r.is_open()) {
            let Some(p) = r.port.number() else { continue };
            if let (Ok(row), Ok(col)) = (hosts.binary_search(&r.host), ports.binary_search(&p)) {
                cells[row * ports.len() + col] = true;
            }
        }
        OpenPortMatrix { hosts, ports, cells }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn ports(&self) -> &[u32] {
        &self.ports
    }

    pub fn cell(&self, row: usize, col: usize) -> bool {
        row < self.hosts.len() && col < self.ports.len() && self.cells[row * self.ports.len() + col]
    }

    #[cfg(test)]
    pub fn is_open(&self, host: &str, port: u32) -> bool {
        match (self.hosts.binary_search_by(|h| h.as_str().cmp(host)), self.ports.binary_search(&port)) {
            (Ok(row), Ok(col)) => self.cell(row, col),
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn open_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() || self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portgrid_core::PortId;

    fn rec(host: &str, port: PortId, state: &str) -> Record {
        Record {
            host: host.into(),
            ip: String::new(),
            proto: "tcp".into(),
            port,
            state: state.into(),
            service: String::new(),
            product: String::new(),
            version: String::new(),
        }
    }

    #[test]
    fn axes_are_sorted_and_deduplicated() {
        let rows = vec![
            rec("web02", PortId::Number(443), "open"),
            rec("web01", PortId::Number(80), "open"),
            rec("web01", PortId::Number(443), "open"),
            rec("db01", PortId::Raw("icmp".into()), "open"),
        ];
        let m = OpenPortMatrix::from_records(&rows);
        assert_eq!(m.hosts(), ["db01", "web01", "web02"]);
        assert_eq!(m.ports(), [80, 443]);
    }

    #[test]
    fn only_open_numeric_observations_are_marked() {
        let rows = vec![
            rec("a", PortId::Number(22), "open"),
            rec("a", PortId::Number(23), "closed"),
            rec("b", PortId::Number(23), "open|filtered"),
            rec("b", PortId::Raw("x".into()), "open"),
        ];
        let m = OpenPortMatrix::from_records(&rows);
        assert!(m.is_open("a", 22));
        assert!(!m.is_open("a", 23));
        assert!(!m.is_open("b", 23));
        assert!(!m.is_open("b", 22));
        assert!(!m.is_open("c", 22));
        assert_eq!(m.open_cells(), 1);
    }

    #[test]
    fn cell_matches_existence_of_open_record() {
        let rows = vec![
            rec("h1", PortId::Number(1), "open"),
            rec("h2", PortId::Number(2), "open"),
            rec("h3", PortId::Number(3), "filtered"),
        ];
        let m = OpenPortMatrix::from_records(&rows);
        for (i, h) in m.hosts().iter().enumerate() {
            for (j, p) in m.ports().iter().enumerate() {
                let expected = rows.iter().any(|r| &r.host == h && r.port.number() == Some(*p) && r.is_open());
                assert_eq!(m.cell(i, j), expected, "{h}:{p}");
            }
        }
    }

    #[test]
    fn empty_input_gives_empty_matrix() {
        let m = OpenPortMatrix::from_records(&[]);
        assert!(m.is_empty());
        assert_eq!(m.open_cells(), 0);
        assert!(!m.cell(0, 0));
    }

    #[test]
    fn host_with_only_raw_ports_keeps_its_row() {
        let m = OpenPortMatrix::from_records(&[rec("solo", PortId::Raw("abc".into()), "open")]);
        assert_eq!(m.hosts(), ["solo"]);
        assert!(m.ports().is_empty());
        assert!(m.is_empty());
    }
}
