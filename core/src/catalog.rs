//! Named catalogs: port lists and the service-definition table
//!
//! Both catalogs are read-only after process start, so they're loaded once
//! into a [`OnceLock`], mirroring the original's
//! `ResourceManager('services').get_jsonc('definitions.jsonc')` eager load.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::InputError;

/// A named port→service-name mapping
#[derive(Debug, Clone, Default)]
pub struct PortList(pub BTreeMap<u16, String>);

/// One entry in the service-definition catalog: a named protocol with the
/// ports it's conventionally found on, an optional probe payload to send,
/// and fallback text hints used when nothing else matches.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    /// Catalog entry name, e.g. `"smb"`
    pub name: &'static str,
    /// Ports this entry is conventionally associated with
    pub ports: &'static [u16],
    /// Probe payload to send when this entry is included in a probe set
    pub probe: Option<&'static [u8]>,
    /// Fallback substrings checked against a cleaned response (weight 30)
    pub hints: &'static [&'static str],
}

fn port_catalogs() -> &'static BTreeMap<&'static str, PortList> {
    static CATALOGS: OnceLock<BTreeMap<&'static str, PortList>> = OnceLock::new();
    CATALOGS.get_or_init(|| {
        let mut map = BTreeMap::new();

        let common: &[(u16, &str)] = &[
            (21, "ftp"),
            (22, "ssh"),
            (23, "telnet"),
            (25, "smtp"),
            (53, "dns"),
            (80, "http"),
            (110, "pop3"),
            (139, "netbios-ssn"),
            (143, "imap"),
            (443, "https"),
            (445, "microsoft-ds"),
            (3306, "mysql"),
            (3389, "rdp"),
            (5432, "postgresql"),
            (8080, "http-alt"),
        ];
        map.insert(
            "common",
            PortList(common.iter().map(|(p, s)| (*p, s.to_string())).collect()),
        );

        let mut default = common.to_vec();
        default.extend_from_slice(&[
            (111, "sunrpc"),
            (631, "ipp"),
            (1080, "socks"),
            (1883, "mqtt"),
            (1935, "rtmp"),
            (2049, "nfs"),
            (6379, "redis"),
            (8883, "mqtts"),
            (9100, "jetdirect"),
        ]);
        map.insert(
            "default",
            PortList(default.iter().map(|(p, s)| (*p, s.to_string())).collect()),
        );

        map
    })
}

/// Returns the names of every registered port catalog entry
pub fn port_list_names() -> Vec<&'static str> {
    port_catalogs().keys().copied().collect()
}

/// Resolves a named port catalog entry
pub fn get_port_list(name: &str) -> Result<PortList, InputError> {
    port_catalogs()
        .get(name)
        .cloned()
        .ok_or_else(|| InputError::UnknownPortList(name.to_string()))
}

/// Resolves `port_list` as either a named catalog entry or an inline,
/// comma-separated range expression (e.g. `"22,80,8000-8010"`), the form
/// the CLI's `--ports` flag accepts beyond the catalog names.
pub fn resolve_ports(port_list: &str) -> Result<Vec<u16>, InputError> {
    if let Ok(list) = get_port_list(port_list) {
        return Ok(list.0.keys().copied().collect());
    }

    let fragments: Vec<String> = port_list.split(',').map(|s| s.trim().to_string()).collect();
    let targets = crate::targets::ports::PortTargets::new(fragments)?;
    let mut ports: Vec<u16> = targets.to_set()?.into_iter().collect();
    ports.sort_unstable();
    Ok(ports)
}

fn service_definitions() -> &'static [ServiceDefinition] {
    static DEFS: OnceLock<Vec<ServiceDefinition>> = OnceLock::new();
    DEFS.get_or_init(|| {
        vec![
            ServiceDefinition {
                name: "smb",
                ports: &[139, 445],
                probe: Some(&[0, 0, 0, 85, 0xff, b'S', b'M', b'B']),
                hints: &["smb", "samba"],
            },
            ServiceDefinition {
                name: "rdp",
                ports: &[3389],
                probe: Some(&[3, 0, 0, 11, 6, 0xe0, 0, 0, 0, 0, 0]),
                hints: &["rdp", "ms-wbt-server"],
            },
            ServiceDefinition {
                name: "redis",
                ports: &[6379],
                probe: Some(b"PING\r\n"),
                hints: &["redis_version"],
            },
            ServiceDefinition {
                name: "postgresql",
                ports: &[5432],
                probe: Some(&[0, 0, 0, 8, 4, 210, 22, 47]),
                hints: &["postgresql", "fatal"],
            },
            ServiceDefinition {
                name: "socks5",
                ports: &[1080],
                probe: Some(&[5, 1, 0]),
                hints: &["socks"],
            },
            ServiceDefinition {
                name: "rtmp",
                ports: &[1935],
                probe: Some(&[3]),
                hints: &["rtmp"],
            },
            ServiceDefinition {
                name: "sunrpc",
                ports: &[111, 2049],
                probe: Some(&[0x80, 0, 0, 40]),
                hints: &["portmapper", "nfs"],
            },
            ServiceDefinition {
                name: "mqtt",
                ports: &[1883, 8883],
                probe: Some(&[0x10, 0x0c, 0, 4, b'M', b'Q', b'T', b'T', 4, 2, 0, 0, 0, 0]),
                hints: &["mqtt"],
            },
            // Beyond the hardcoded "known protocol" probes above, the
            // catalog also carries third-party protocol entries a BASIC/
            // AGGRESSIVE scan picks up that LAZY does not.
            ServiceDefinition {
                name: "vnc",
                ports: &[5900],
                probe: None,
                hints: &["rfb "],
            },
            ServiceDefinition {
                name: "bittorrent",
                ports: &[6881],
                probe: None,
                hints: &["bittorrent"],
            },
            ServiceDefinition {
                name: "minecraft",
                ports: &[25565],
                probe: None,
                hints: &["minecraft"],
            },
        ]
    })
}

/// The hardcoded "known protocol" names whose binary probes are appended
/// unconditionally regardless of [`crate::config::ServiceScanStrategy`].
/// The remaining catalog entries are the third-party catalog additions
/// that BASIC/AGGRESSIVE pull in but LAZY does not.
pub const KNOWN_PROTOCOL_NAMES: &[&str] = &[
    "smb", "rdp", "redis", "postgresql", "socks5", "rtmp", "sunrpc", "mqtt",
];

/// Returns the catalog entry matching `name`, if any
pub fn service_definition(name: &str) -> Option<&'static ServiceDefinition> {
    service_definitions().iter().find(|d| d.name == name)
}

/// Returns every catalog entry whose `ports` includes `port`
pub fn service_definitions_for_port(port: u16) -> Vec<&'static ServiceDefinition> {
    service_definitions()
        .iter()
        .filter(|d| d.ports.contains(&port))
        .collect()
}

/// Returns every catalog entry
pub fn all_service_definitions() -> &'static [ServiceDefinition] {
    service_definitions()
}

#[cfg(test)]
#[path = "./catalog_tests.rs"]
mod tests;
