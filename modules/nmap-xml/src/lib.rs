//! Nmap XML (`-oX`) reader producing normalized records.
//!
//! Structured input is treated as a contract: a document that fails to parse
//! aborts with an error and yields no records.

use portgrid_core::{PortId, Record};
use roxmltree::{Document, Node, ParsingOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum XmlParseError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML document: {0}")]
    Malformed(#[from] roxmltree::Error),
}

/// Read and parse an Nmap XML file.
pub fn parse_file(path: &Path) -> Result<Vec<Record>, XmlParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| XmlParseError::Io { path: path.to_path_buf(), source })?;
    parse_str(&text)
}

/// Parse an Nmap XML document held in memory.
pub fn parse_str(text: &str) -> Result<Vec<Record>, XmlParseError> {
    // nmap always writes a <!DOCTYPE nmaprun> line
    let mut opts = ParsingOptions::default();
    opts.allow_dtd = true;
    let doc = Document::parse_with_options(text, opts)?;
    let mut rows = Vec::new();
    for host in children(doc.root_element(), "host") {
        collect_host(host, &mut rows);
    }
    Ok(rows)
}

fn children<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &'static str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.is_element() && n.has_tag_name(tag))
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    children(node, tag).next()
}

fn attr(node: Option<Node<'_, '_>>, name: &str) -> String {
    node.and_then(|n| n.attribute(name)).unwrap_or_default().to_string()
}

fn collect_host(host: Node<'_, '_>, rows: &mut Vec<Record>) {
    let status = child(host, "status").and_then(|s| s.attribute("state"));
    if status != Some("up") {
        debug!(status = ?status, "skipping host that is not up");
        return;
    }

    let addr = children(host, "address")
        .find(|a| matches!(a.attribute("addrtype"), Some("ipv4") | Some("ipv6")))
        .and_then(|a| a.attribute("addr"))
        .unwrap_or_default()
        .to_string();
    let hostname = attr(child(host, "hostnames").and_then(|h| child(h, "hostname")), "name");
    let display_name = if hostname.is_empty() { addr.clone() } else { hostname };

    let Some(ports) = child(host, "ports") else {
        debug!(host = %display_name, "host has no ports section");
        return;
    };

    for port in children(ports, "port") {
        let service = child(port, "service");
        rows.push(Record {
            host: display_name.clone(),
            ip: addr.clone(),
            proto: attr(Some(port), "protocol"),
            port: PortId::parse(port.attribute("portid").unwrap_or_default()),
            state: attr(child(port, "state"), "state"),
            service: attr(service, "name"),
            product: attr(service, "product"),
            version: attr(service, "version"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE nmaprun>\n";

    fn doc(hosts: &str) -> String {
        format!("{HEADER}<nmaprun scanner=\"nmap\">{hosts}<runstats/></nmaprun>")
    }

    #[test]
    fn single_up_host_single_port() {
        let xml = doc(r#"
            <host>
              <status state="up" reason="syn-ack"/>
              <address addr="10.0.0.5" addrtype="ipv4"/>
              <hostnames><hostname name="web01" type="PTR"/></hostnames>
              <ports>
                <port protocol="tcp" portid="80"><state state="open"/><service name="http"/></port>
              </ports>
            </host>"#);
        let rows = parse_str(&xml).unwrap();
        assert_eq!(rows, vec![Record {
            host: "web01".into(),
            ip: "10.0.0.5".into(),
            proto: "tcp".into(),
            port: PortId::Number(80),
            state: "open".into(),
            service: "http".into(),
            product: String::new(),
            version: String::new(),
        }]);
    }

    #[test]
    fn hosts_not_up_are_skipped() {
        let xml = doc(r#"
            <host>
              <status state="down"/>
              <address addr="10.0.0.6" addrtype="ipv4"/>
              <ports><port protocol="tcp" portid="22"><state state="open"/></port></ports>
            </host>
            <host>
              <address addr="10.0.0.7" addrtype="ipv4"/>
              <ports><port protocol="tcp" portid="22"><state state="open"/></port></ports>
            </host>"#);
        assert!(parse_str(&xml).unwrap().is_empty());
    }

    #[test]
    fn mac_addresses_are_ignored_and_ip_is_host_fallback() {
        let xml = doc(r#"
            <host>
              <status state="up"/>
              <address addr="AA:BB:CC:DD:EE:FF" addrtype="mac" vendor="Acme"/>
              <address addr="fe80::1" addrtype="ipv6"/>
              <ports><port protocol="udp" portid="53"><state state="open|filtered"/><service name="domain"/></port></ports>
            </host>"#);
        let rows = parse_str(&xml).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].host, "fe80::1");
        assert_eq!(rows[0].ip, "fe80::1");
        assert_eq!(rows[0].proto, "udp");
        assert_eq!(rows[0].state, "open|filtered");
    }

    #[test]
    fn host_without_ports_contributes_nothing() {
        let xml = doc(r#"<host><status state="up"/><address addr="10.0.0.8" addrtype="ipv4"/></host>"#);
        assert!(parse_str(&xml).unwrap().is_empty());
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let xml = doc(r#"
            <host>
              <status state="up"/>
              <address addr="10.0.0.9" addrtype="ipv4"/>
              <ports>
                <port protocol="tcp" portid="443"/>
                <port protocol="tcp" portid="8443">
                  <state state="open"/>
                  <service name="https-alt" product="nginx" version="1.25.3"/>
                </port>
              </ports>
            </host>"#);
        let rows = parse_str(&xml).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state, "");
        assert_eq!(rows[0].service, "");
        assert_eq!(rows[0].product, "");
        assert_eq!(rows[1].product, "nginx");
        assert_eq!(rows[1].version, "1.25.3");
    }

    #[test]
    fn non_numeric_portid_is_preserved() {
        let xml = doc(r#"
            <host>
              <status state="up"/>
              <address addr="10.0.0.10" addrtype="ipv4"/>
              <ports><port protocol="ip" portid="icmp"><state state="open"/></port></ports>
            </host>"#);
        let rows = parse_str(&xml).unwrap();
        assert_eq!(rows[0].port, PortId::Raw("icmp".into()));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = parse_str("<nmaprun><host><status state=\"up\"></nmaprun>").unwrap_err();
        assert!(matches!(err, XmlParseError::Malformed(_)));
    }

    #[test]
    fn parsing_is_deterministic() {
        let xml = doc(r#"
            <host><status state="up"/><address addr="10.0.0.2" addrtype="ipv4"/>
              <ports>
                <port protocol="tcp" portid="443"><state state="open"/></port>
                <port protocol="tcp" portid="22"><state state="closed"/></port>
              </ports>
            </host>
            <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/>
              <ports><port protocol="udp" portid="161"><state state="open"/></port></ports>
            </host>"#);
        assert_eq!(parse_str(&xml).unwrap(), parse_str(&xml).unwrap());
    }

    #[test]
    fn unreadable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.xml");
        let err = parse_file(&missing).unwrap_err();
        assert!(matches!(err, XmlParseError::Io { .. }));
        assert!(err.to_string().contains("nope.xml"));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.xml");
        std::fs::write(&path, doc(r#"<host><status state="up"/><address addr="192.0.2.1" addrtype="ipv4"/>
            <ports><port protocol="tcp" portid="25"><state state="open"/><service name="smtp"/></port></ports></host>"#)).unwrap();
        let rows = parse_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].service, "smtp");
    }
}
