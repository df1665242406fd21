//! Liveness discovery: deciding whether a host is present on the network
//!
//! Polymorphic over the lookup strategies named in [`crate::config::LookupType`].
//! The scanner consults `ScanConfig.lookup_type` in order; the first method
//! that reports alive wins, matching the original's early-exit loop over
//! configured lookup methods.

pub mod arp;
pub mod icmp;
pub mod poke;

use std::net::Ipv4Addr;

use crate::config::{ArpConfig, LookupType, PingConfig, PokeConfig};
use crate::process::ProcessRunner;

/// Outcome of consulting one or more lookup methods for a single host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessResult {
    /// Whether any consulted method reported the host alive
    pub alive: bool,
    /// MACs harvested along the way (ARP table hits), insertion order preserved
    pub macs: Vec<String>,
    /// Name of the method that first reported alive, if any
    pub decided_by: Option<&'static str>,
}

/// Runs `lookup_types` in order against `ip`, stopping at the first method
/// that reports alive. `POKE_THEN_ARP`/`ICMP_THEN_ARP` always attempt an ARP
/// harvest afterward even though a different method decided liveness.
pub fn check_liveness(
    runner: &dyn ProcessRunner,
    ip: Ipv4Addr,
    lookup_types: &[LookupType],
    ping_config: &PingConfig,
    arp_config: &ArpConfig,
    poke_config: &PokeConfig,
) -> LivenessResult {
    for lookup_type in lookup_types {
        let (alive, decided_by) = match lookup_type {
            LookupType::Icmp => (icmp::ping(runner, ip, ping_config), "icmp"),
            LookupType::Arp => {
                let macs = arp::lookup(runner, ip, arp_config);
                (!macs.is_empty(), "arp")
            }
            LookupType::Poke => (poke::poke(ip, poke_config), "poke"),
            LookupType::PokeThenArp => (poke::poke(ip, poke_config), "poke_then_arp"),
            LookupType::IcmpThenArp => (icmp::ping(runner, ip, ping_config), "icmp_then_arp"),
        };

        if !alive {
            continue;
        }

        let macs = match lookup_type {
            LookupType::Arp => arp::lookup(runner, ip, arp_config),
            LookupType::PokeThenArp | LookupType::IcmpThenArp => {
                arp::lookup(runner, ip, arp_config)
            }
            _ => Vec::new(),
        };

        return LivenessResult {
            alive: true,
            macs,
            decided_by: Some(decided_by),
        };
    }

    LivenessResult::default()
}

/// Reports whether ARP-based lookup is usable in this environment. When
/// false, callers MUST substitute a poke-based config and SHOULD emit a
/// degraded-mode warning.
pub fn is_arp_supported(runner: &dyn ProcessRunner) -> bool {
    runner.is_available("arp")
}

#[cfg(test)]
#[path = "./mod_tests.rs"]
mod tests;
