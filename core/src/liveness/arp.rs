//! ARP table lookup via the OS `arp` tool

use std::net::Ipv4Addr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::config::ArpConfig;
use crate::process::ProcessRunner;

fn mac_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b([0-9a-f]{2}([:-][0-9a-f]{2}){5})\b").expect("static regex is valid")
    })
}

/// Invokes `arp -a ip` (or `arp -n ip` on platforms without `-a` per-host
/// support) and extracts every `xx:xx:xx:xx:xx:xx`-shaped token from stdout.
/// The last match is conventionally the device's primary, matching the
/// original's "last MAC in output wins" behavior, but every match is
/// returned so the caller can decide.
/// Dash-separated forms are normalized to colons and uppercased.
pub fn lookup(runner: &dyn ProcessRunner, ip: Ipv4Addr, config: &ArpConfig) -> Vec<String> {
    let ip_str = ip.to_string();
    let timeout = Duration::from_secs_f64(config.timeout.max(0.1));

    for attempt in 0..config.attempts.max(1) {
        let (output, _ok) = runner.run("arp", &["-a", ip_str.as_str()], timeout);

        let macs: Vec<String> = mac_pattern()
            .find_iter(&output)
            .map(|m| m.as_str().replace('-', ":").to_uppercase())
            .collect();

        if !macs.is_empty() {
            return macs;
        }

        if attempt + 1 < config.attempts {
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    Vec::new()
}

#[cfg(test)]
#[path = "./arp_tests.rs"]
mod tests;
