//! POKE liveness: a bare TCP connect attempt against well-known ports,
//! cheap enough to run before resolving ARP and sufficient to then harvest
//! a MAC even on hosts that drop ICMP.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::PokeConfig;

/// Ports a poke probe tries, in order; any completed handshake — even one
/// answered with RST — proves host presence.
const WELL_KNOWN_PORTS: &[u16] = &[80, 443, 22, 445];

/// Attempts a TCP connect to each of [`WELL_KNOWN_PORTS`] in turn, retrying
/// the whole set up to `config.retries` times. Returns true on the first
/// port that completes a connection.
pub fn poke(ip: Ipv4Addr, config: &PokeConfig) -> bool {
    let timeout = Duration::from_secs_f64(config.timeout.max(0.01));

    for _ in 0..config.retries.max(1) {
        for &port in WELL_KNOWN_PORTS {
            let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));
            if TcpStream::connect_timeout(&addr, timeout).is_ok() {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
#[path = "./poke_tests.rs"]
mod tests;
