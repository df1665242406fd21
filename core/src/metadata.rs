//! Device metadata resolution: reverse DNS hostname and MAC-derived vendor
//!
//! Runs after liveness confirms a host exists, filling in the fields a raw
//! IP address alone can't provide.

use std::net::Ipv4Addr;

use crate::device::Device;
use crate::mac_vendor;

/// Resolves `ip`'s PTR record via reverse DNS. `None` if the lookup fails or
/// the record doesn't exist; a missing PTR is routine on a LAN and never
/// treated as an error.
pub fn resolve_hostname(ip: Ipv4Addr) -> Option<String> {
    dns_lookup::lookup_addr(&ip.into()).ok().filter(|h| !h.is_empty())
}

/// Fills `device.hostname` and `device.manufacturer` in place from whatever
/// MACs are already recorded on it. Vendor resolution uses the first MAC in
/// insertion order, matching the original's "first ARP reply wins" behavior
/// when a host has multiple interfaces/MACs observed.
pub fn enrich(device: &mut Device) {
    if device.hostname.is_none() {
        if let Ok(ip) = device.ip.parse::<Ipv4Addr>() {
            device.hostname = resolve_hostname(ip);
        }
    }

    if device.manufacturer.is_none() {
        device.manufacturer = device.macs.first().and_then(|mac| mac_vendor::lookup(mac));
    }
}

#[cfg(test)]
#[path = "./metadata_tests.rs"]
mod tests;
