//! Scan configuration types
//!
//! `ScanConfig` and its sub-configs are the serializable contract between a
//! caller (CLI flags, an HTTP body, a `ReliabilityQueue` job) and the
//! [`crate::scanner::Scanner`]. Every field round-trips losslessly through
//! `serde_json`: optional fields carry
//! `#[serde(default)]` so a partial JSON body still produces a valid config,
//! matching the original Python's `from_dict` which fills in dataclass
//! defaults for any missing key.

use serde::{Deserialize, Serialize};

/// Per-attempt ICMP ping behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    /// Number of retry attempts if a ping does not see a reply
    pub attempts: u32,
    /// Number of echo requests sent per attempt (passed to the OS `ping` tool)
    pub ping_count: u32,
    /// Per-attempt timeout in seconds
    pub timeout: f64,
    /// Delay between retries in seconds
    pub retry_delay: f64,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            ping_count: 2,
            timeout: 1.0,
            retry_delay: 0.5,
        }
    }
}

/// ARP lookup behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpConfig {
    /// Number of retry attempts
    pub attempts: u32,
    /// Per-attempt timeout in seconds
    pub timeout: f64,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            timeout: 1.0,
        }
    }
}

/// TCP-poke liveness behavior: a handshake (even a RST) against a
/// well-known port proves host presence, cheap enough to run before
/// resolving ARP. The minimal recognized field set is just `timeout`/`retries`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PokeConfig {
    /// Per-port connect timeout in seconds
    pub timeout: f64,
    /// Number of retries per port before giving up
    pub retries: u32,
}

impl Default for PokeConfig {
    fn default() -> Self {
        Self {
            timeout: 0.5,
            retries: 1,
        }
    }
}

/// TCP-connect port scan behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortScanConfig {
    /// Per-attempt connect timeout in seconds
    pub timeout: f64,
    /// Number of retries per port
    pub retries: u32,
    /// Delay between retries in seconds
    pub retry_delay: f64,
}

impl Default for PortScanConfig {
    fn default() -> Self {
        Self {
            timeout: 1.0,
            retries: 1,
            retry_delay: 0.25,
        }
    }
}

/// Probe-set breadth for service fingerprinting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceScanStrategy {
    /// Baseline probes plus port-specific binary probes only
    Lazy,
    /// Lazy, plus catalog probes whose entry names this port
    Basic,
    /// Lazy, plus every named protocol probe and every catalog probe
    Aggressive,
}

impl Default for ServiceScanStrategy {
    fn default() -> Self {
        Self::Basic
    }
}

/// Service fingerprinting behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceScanConfig {
    /// Per-probe connect timeout in seconds; read timeout is half this value
    pub timeout: f64,
    /// Probe-set breadth
    pub lookup_type: ServiceScanStrategy,
    /// Maximum probes in flight per (device, port) at once
    pub max_concurrent_probes: usize,
}

impl Default for ServiceScanConfig {
    fn default() -> Self {
        Self {
            timeout: 3.0,
            lookup_type: ServiceScanStrategy::Basic,
            max_concurrent_probes: 10,
        }
    }
}

/// Ordered liveness lookup strategies. The scanner consults these in order;
/// the first method that reports "alive" wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupType {
    /// OS ICMP `ping`
    Icmp,
    /// OS `arp` table lookup only
    Arp,
    /// TCP poke against well-known ports
    Poke,
    /// Poke decides liveness; ARP harvests MAC afterward
    PokeThenArp,
    /// ICMP decides liveness; ARP harvests MAC afterward
    IcmpThenArp,
}

/// Top level scan configuration. Immutable after a scan starts; every field
/// is `Clone` so [`crate::reliability::ReliabilityQueue::enqueue`] can give
/// each queued run its own independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Address-range expression, see [`crate::ip_parser`]
    pub subnet: String,
    /// Name of the port catalog entry to scan, see [`crate::catalog::PortList`]
    pub port_list: String,
    /// Multiplier applied to every thread-pool sizing knob, floor 1
    pub t_multiplier: f64,
    /// Base devices scanned in parallel during port scanning
    pub t_cnt_port_scan: u32,
    /// Base ports tested in parallel per device
    pub t_cnt_port_test: u32,
    /// Base liveness workers
    pub t_cnt_isalive: u32,
    /// Whether to run the port-scanning stage at all
    pub task_scan_ports: bool,
    /// Whether to run service fingerprinting; ignored if `task_scan_ports` is false
    pub task_scan_port_services: bool,
    /// Ordered liveness lookup strategies to try per host
    pub lookup_type: Vec<LookupType>,
    /// ICMP sub-config
    pub ping_config: PingConfig,
    /// ARP sub-config
    pub arp_config: ArpConfig,
    /// Poke sub-config
    pub poke_config: PokeConfig,
    /// Port-scan sub-config
    pub port_scan_config: PortScanConfig,
    /// Service-scan sub-config
    pub service_scan_config: ServiceScanConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subnet: String::new(),
            port_list: "common".to_string(),
            t_multiplier: 1.0,
            t_cnt_port_scan: 10,
            t_cnt_port_test: 128,
            t_cnt_isalive: 256,
            task_scan_ports: true,
            task_scan_port_services: false,
            lookup_type: vec![LookupType::IcmpThenArp],
            ping_config: PingConfig::default(),
            arp_config: ArpConfig::default(),
            poke_config: PokeConfig::default(),
            port_scan_config: PortScanConfig::default(),
            service_scan_config: ServiceScanConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Returns a config with `subnet` and `port_list` set, everything else defaulted
    pub fn new(subnet: String, port_list: String) -> Self {
        Self {
            subnet,
            port_list,
            ..Default::default()
        }
    }

    /// Scales `base` by `t_multiplier`, floored at 1
    pub fn t_cnt(&self, base: u32) -> usize {
        ((base as f64) * self.t_multiplier).max(1.0) as usize
    }

    /// Returns the number of liveness workers
    pub fn isalive_workers(&self) -> usize {
        self.t_cnt(self.t_cnt_isalive)
    }

    /// Returns the number of devices scanned for ports in parallel
    pub fn port_scan_workers(&self) -> usize {
        self.t_cnt(self.t_cnt_port_scan)
    }

    /// Returns the number of ports tested in parallel per device
    pub fn port_test_workers(&self) -> usize {
        self.t_cnt(self.t_cnt_port_test)
    }

    /// Named default configs, grounded on the HTTP layer's
    /// `/api/tools/config/defaults` endpoint
    pub fn named_default(name: &str) -> Option<Self> {
        match name {
            "accurate" => Some(Self {
                lookup_type: vec![LookupType::IcmpThenArp, LookupType::PokeThenArp],
                task_scan_port_services: true,
                ..Default::default()
            }),
            "fast" => Some(Self {
                t_multiplier: 2.0,
                lookup_type: vec![LookupType::Poke],
                task_scan_port_services: false,
                ..Default::default()
            }),
            "default" => Some(Self::default()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "./config_tests.rs"]
mod tests;
