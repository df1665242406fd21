//! Bounded-concurrency TCP-connect port scanning
//!
//! Per device, a bounded worker pool attempts a connect on every configured
//! port; across devices the caller (the [`crate::scanner::Scanner`]) bounds
//! how many devices run in parallel, fanning out with a `threadpool::ThreadPool`
//! + `mpsc` pattern adapted from packet-level SYN probing to a plain connect.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use threadpool::ThreadPool;

use crate::config::PortScanConfig;

/// Outcome of testing a single port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortResult {
    /// The port tested
    pub port: u16,
    /// Whether the connect attempt succeeded within the enforcer window
    pub open: bool,
}

/// Tests whether `port` is open on `ip`, retrying on failure per
/// `config.retries`/`config.retry_delay`. The whole call is capped at
/// `timeout × (retries + 1) × 1.5` wall-clock seconds; exceeding that
/// window reports closed rather than propagating.
pub fn test_port(ip: Ipv4Addr, port: u16, config: &PortScanConfig) -> PortResult {
    let deadline = Instant::now()
        + Duration::from_secs_f64(config.timeout * (config.retries as f64 + 1.0) * 1.5);
    let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));
    let connect_timeout = Duration::from_secs_f64(config.timeout.max(0.001));

    for attempt in 0..=config.retries {
        if Instant::now() >= deadline {
            break;
        }

        if TcpStream::connect_timeout(&addr, connect_timeout).is_ok() {
            return PortResult { port, open: true };
        }

        if attempt < config.retries {
            std::thread::sleep(Duration::from_secs_f64(config.retry_delay));
        }
    }

    PortResult { port, open: false }
}

/// Scans every port in `ports` against `ip` using `workers` threads,
/// returning results in arbitrary order.
pub fn scan_device(
    ip: Ipv4Addr,
    ports: &[u16],
    workers: usize,
    config: &PortScanConfig,
) -> Vec<PortResult> {
    if ports.is_empty() {
        return Vec::new();
    }

    let pool = ThreadPool::new(workers.max(1));
    let (tx, rx) = mpsc::channel::<PortResult>();
    let config = *config;

    for &port in ports {
        let tx = tx.clone();
        pool.execute(move || {
            let result = test_port(ip, port, &config);
            let _ = tx.send(result);
        });
    }
    drop(tx);

    rx.iter().collect()
}

#[cfg(test)]
#[path = "./port_scan_tests.rs"]
mod tests;
