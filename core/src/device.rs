//! Device inventory types: what the scanner knows about a single host, and
//! the services discovered behind its open ports.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Where a device currently sits in its own per-host pipeline, independent
/// of the overall [`crate::scanner::Scanner`] stage. A device can be
/// `Complete` while the scanner as a whole is still testing other hosts'
/// ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStage {
    /// Liveness confirmed, nothing else probed yet
    Found,
    /// Port/service probing in progress
    Scanning,
    /// All requested probing finished for this device
    Complete,
    /// A probe failed in a way that aborted further work on this device
    Error,
}

/// A single recorded failure for a device, carrying enough to debug without
/// unwinding the whole scan (mirrors the original's per-device error log
/// entries rather than a raised exception).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceErrorInfo {
    /// Which stage produced the failure, e.g. `"port_scan"`, `"service_scan"`
    pub source: String,
    /// Human readable failure message
    pub message: String,
}

/// What was learned about the service living behind one open port.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Port this service info is attached to
    pub port: u16,
    /// Best-guess protocol/service name, e.g. `"http"`, `"ssh"`, `"unknown"`
    pub service: String,
    /// The probe payload that produced the identifying response, truncated
    /// and rendered lossily (non-UTF8 bytes replaced) for display
    pub request: String,
    /// The response that matched, truncated the same way
    pub response: String,
    /// Total probes attempted against this port
    pub probes_sent: u32,
    /// Probes that received any response at all
    pub probes_received: u32,
    /// Whether the matching response was observed over a TLS-wrapped
    /// connection rather than plaintext
    pub is_tls: bool,
}

/// A single discovered host and everything learned about it over the
/// course of a scan. Every optional field defaults cleanly so a `Device`
/// freshly created from a liveness hit alone still serializes sensibly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    /// Dotted-quad address
    pub ip: String,
    /// Liveness: `None` until a liveness check has run, then `Some(true)` or
    /// `Some(false)`
    pub alive: Option<bool>,
    /// Reverse-DNS hostname, if resolved
    pub hostname: Option<String>,
    /// MAC addresses observed for this IP, colon-delimited uppercase hex,
    /// insertion order preserved
    pub macs: Vec<String>,
    /// Vendor name resolved from the first known MAC via OUI lookup
    pub manufacturer: Option<String>,
    /// Ports confirmed open
    pub ports: BTreeSet<u16>,
    /// Count of ports tested regardless of outcome, used to distinguish
    /// "closed" from "not yet scanned" in a partial/in-progress scan
    pub ports_scanned: u32,
    /// Open ports grouped by resolved service name, e.g. `"https" -> [443]`
    pub services: BTreeMap<String, Vec<u16>>,
    /// Per-port service fingerprint detail
    pub service_info: Vec<ServiceInfo>,
    /// Current per-device pipeline stage
    pub stage: Option<DeviceStage>,
    /// Recorded failures for this device; a failure here never aborts the
    /// overall scan
    pub errors: Vec<DeviceErrorInfo>,
}

impl Device {
    /// Returns a freshly discovered device with `stage` set to `Found`
    pub fn new(ip: String) -> Self {
        Self {
            ip,
            stage: Some(DeviceStage::Found),
            ..Default::default()
        }
    }

    /// Records a MAC address if not already present, preserving first-seen order
    pub fn add_mac(&mut self, mac: String) {
        if !self.macs.iter().any(|m| m.eq_ignore_ascii_case(&mac)) {
            self.macs.push(mac);
        }
    }

    /// Records a non-fatal per-device error
    pub fn record_error(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.errors.push(DeviceErrorInfo {
            source: source.into(),
            message: message.into(),
        });
    }

    /// Counts `port` as scanned and, if `open`, adds it to the open-port set
    pub fn record_port_result(&mut self, port: u16, open: bool) {
        self.ports_scanned += 1;
        if open {
            self.ports.insert(port);
        }
    }

    /// Records a resolved service fingerprint, filing it under both the
    /// per-port detail list and the name-to-ports grouping
    pub fn record_service_info(&mut self, info: ServiceInfo) {
        self.services.entry(info.service.clone()).or_default().push(info.port);
        self.service_info.push(info);
    }
}

#[cfg(test)]
#[path = "./device_tests.rs"]
mod tests;
