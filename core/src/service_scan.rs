//! Service fingerprinting: the densest subsystem in this crate.
//!
//! Given a live device and an open port, sends a battery of probes
//! concurrently, watches for the first non-blank reply, escalates to TLS
//! when the reply looks like a TLS record, and resolves a weighted
//! service identity from the cleaned response.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::sync::mpsc;
use std::time::Duration;

use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use threadpool::ThreadPool;

use crate::catalog::{self, KNOWN_PROTOCOL_NAMES};
use crate::config::{ServiceScanConfig, ServiceScanStrategy};
use crate::device::ServiceInfo;

/// Ports that can cause real printers to emit blank pages if prodded;
/// service scanning on these short-circuits to a fixed identity.
const PRINTER_PORTS: &[u16] = &[9100, 631];

const BASELINE_PROBES: &[Option<&[u8]>] = &[
    None,
    Some(b"\r\n"),
    Some(b"HELP\r\n"),
    Some(b"OPTIONS * HTTP/1.0\r\n\r\n"),
    Some(b"HEAD / HTTP/1.0\r\n\r\n"),
    Some(b"QUIT\r\n"),
];

const MAX_RESPONSE_LEN: usize = 512;
const READ_BUF_CAP: usize = 1024;

/// A weighted candidate service identity
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    service: String,
    weight: u32,
}

struct TextMatcher {
    name: &'static str,
    weight: u32,
    patterns: &'static [&'static str],
    case_sensitive: bool,
}

const TEXT_MATCHERS: &[TextMatcher] = &[
    TextMatcher { name: "HTTP", weight: 70, patterns: &["HTTP/1.", "HTTP/2"], case_sensitive: true },
    TextMatcher { name: "SSH", weight: 90, patterns: &["SSH-"], case_sensitive: true },
    TextMatcher { name: "FTP", weight: 85, patterns: &["220 "], case_sensitive: false },
    TextMatcher { name: "SMTP", weight: 85, patterns: &["220 ", "ESMTP"], case_sensitive: false },
    TextMatcher { name: "POP3", weight: 80, patterns: &["+OK"], case_sensitive: true },
    TextMatcher { name: "IMAP", weight: 80, patterns: &["* OK"], case_sensitive: true },
    TextMatcher { name: "MySQL", weight: 75, patterns: &["mysql_native_password"], case_sensitive: false },
];

/// Binary-signature table: byte sequences that, if contained anywhere in
/// the raw reply, identify a service outright. Checked
/// before text matchers since a binary signature is a stronger signal.
const BINARY_SIGNATURES: &[(&[u8], &str, u32)] = &[
    (&[0, 0, 0, 85, 0xff, b'S', b'M', b'B'], "SMB", 95),
    (&[3, 0, 0, 11, 6, 0xe0], "RDP", 95),
];

fn looks_like_tls_record(buf: &[u8]) -> bool {
    buf.len() >= 3
        && (0x14..=0x17).contains(&buf[0])
        && buf[1] == 0x03
        && (0x01..=0x04).contains(&buf[2])
}

/// Generates the probe set for `port` under `strategy`. Returned probes are deduplicated; `None`
/// entries (banner-grab) are always kept distinct from any `Some(&[])`.
fn probe_set(port: u16, strategy: ServiceScanStrategy) -> Vec<Option<Vec<u8>>> {
    let mut probes: Vec<Option<Vec<u8>>> = BASELINE_PROBES.iter().map(|p| p.map(|b| b.to_vec())).collect();
    let mut seen: HashSet<Option<Vec<u8>>> = probes.iter().cloned().collect();

    let mut push = |payload: Option<Vec<u8>>, probes: &mut Vec<Option<Vec<u8>>>, seen: &mut HashSet<Option<Vec<u8>>>| {
        if seen.insert(payload.clone()) {
            probes.push(payload);
        }
    };

    // known-protocol probes: unconditional regardless of strategy
    for def in catalog::service_definitions_for_port(port) {
        if KNOWN_PROTOCOL_NAMES.contains(&def.name) {
            if let Some(probe) = def.probe {
                push(Some(probe.to_vec()), &mut probes, &mut seen);
            }
        }
    }

    match strategy {
        ServiceScanStrategy::Lazy => {}
        ServiceScanStrategy::Basic => {
            for def in catalog::service_definitions_for_port(port) {
                if let Some(probe) = def.probe {
                    push(Some(probe.to_vec()), &mut probes, &mut seen);
                }
            }
        }
        ServiceScanStrategy::Aggressive => {
            for def in catalog::all_service_definitions() {
                if let Some(probe) = def.probe {
                    push(Some(probe.to_vec()), &mut probes, &mut seen);
                }
            }
        }
    }

    probes
}

/// Result of a single probe attempt. `probes_sent` counts every probe that
/// was launched regardless of outcome, so this carries no "sent" flag —
/// only whether a reply was received.
struct ProbeOutcome {
    received: bool,
    reply: Vec<u8>,
    request: Vec<u8>,
}

fn run_one_probe(
    ip: Ipv4Addr,
    port: u16,
    payload: &Option<Vec<u8>>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> ProbeOutcome {
    let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));
    let request = payload.clone().unwrap_or_default();

    let Ok(mut stream) = TcpStream::connect_timeout(&addr, connect_timeout) else {
        return ProbeOutcome { received: false, reply: Vec::new(), request };
    };

    let _ = stream.set_read_timeout(Some(read_timeout));
    let _ = stream.set_write_timeout(Some(read_timeout));

    if let Some(bytes) = payload {
        if stream.write_all(bytes).is_err() {
            return ProbeOutcome { received: false, reply: Vec::new(), request };
        }
    }

    let mut buf = vec![0u8; READ_BUF_CAP];
    match stream.read(&mut buf) {
        Ok(n) => {
            buf.truncate(n);
            ProbeOutcome { received: true, reply: buf, request }
        }
        Err(_) => ProbeOutcome { received: false, reply: Vec::new(), request },
    }
}

fn tls_probe(ip: Ipv4Addr, port: u16, connect_timeout: Duration, read_timeout: Duration) -> Option<(Vec<u8>, Vec<u8>)> {
    let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));
    let stream = TcpStream::connect_timeout(&addr, connect_timeout).ok()?;
    let _ = stream.set_read_timeout(Some(read_timeout));
    let _ = stream.set_write_timeout(Some(read_timeout));

    let mut connector = SslConnector::builder(SslMethod::tls()).ok()?;
    connector.set_verify(SslVerifyMode::NONE);
    let connector = connector.build();

    let mut tls_stream = connector.connect(&ip.to_string(), stream).ok()?;

    let request = b"HEAD / HTTP/1.0\r\n\r\n".to_vec();
    tls_stream.write_all(&request).ok()?;

    let mut buf = vec![0u8; READ_BUF_CAP];
    let n = tls_stream.read(&mut buf).unwrap_or(0);
    buf.truncate(n);

    Some((request, buf))
}

/// Strips non-printable bytes (other than `\n`/`\r`/`\t`), trims, and
/// truncates to [`MAX_RESPONSE_LEN`] characters including a `...` suffix.
fn clean_response(raw: &[u8]) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for &byte in raw {
        match byte {
            b'\n' | b'\r' | b'\t' => cleaned.push(byte as char),
            0x20..=0x7e => cleaned.push(byte as char),
            _ => cleaned.push_str(&format!("\\x{byte:02X}")),
        }
    }

    let trimmed = cleaned.trim().to_string();

    if trimmed.chars().count() <= MAX_RESPONSE_LEN {
        trimmed
    } else {
        let truncated: String = trimmed.chars().take(MAX_RESPONSE_LEN - 3).collect();
        format!("{truncated}...")
    }
}

fn identify_service(raw: &[u8], response: &str, is_tls: bool) -> Candidate {
    let mut best = Candidate { service: "Unknown".to_string(), weight: 0 };

    for (signature, name, weight) in BINARY_SIGNATURES {
        if !signature.is_empty()
            && raw.windows(signature.len()).any(|w| w == *signature)
            && *weight > best.weight
        {
            best = Candidate { service: name.to_string(), weight: *weight };
        }
    }

    for matcher in TEXT_MATCHERS {
        let haystack = if matcher.case_sensitive { response.to_string() } else { response.to_lowercase() };
        let hit = matcher.patterns.iter().any(|p| {
            let needle = if matcher.case_sensitive { p.to_string() } else { p.to_lowercase() };
            haystack.contains(&needle)
        });
        if hit && matcher.weight > best.weight {
            best = Candidate { service: matcher.name.to_string(), weight: matcher.weight };
        }
    }

    if best.weight == 0 {
        let lower = response.to_lowercase();
        for def in catalog::all_service_definitions() {
            if def.hints.iter().any(|h| lower.contains(&h.to_lowercase())) {
                best = Candidate { service: def.name.to_string(), weight: 30 };
                break;
            }
        }
    }

    if is_tls && best.weight < 80 {
        best = Candidate { service: "HTTPS".to_string(), weight: 80 };
    }

    best
}

/// Runs the full service identification pipeline for one (device, port)
/// pair. Never propagates a connection error — an unreachable port simply
/// yields zero `probes_received` and service `"Unknown"`.
pub fn scan_service(ip: Ipv4Addr, port: u16, config: &ServiceScanConfig) -> ServiceInfo {
    if PRINTER_PORTS.contains(&port) {
        return ServiceInfo {
            port,
            service: "Printer".to_string(),
            ..Default::default()
        };
    }

    let connect_timeout = Duration::from_secs_f64(config.timeout.max(0.01));
    let read_timeout = Duration::from_secs_f64((config.timeout / 2.0).max(0.01));
    let probes = probe_set(port, config.lookup_type);

    let pool = ThreadPool::new(config.max_concurrent_probes.max(1));
    let (tx, rx) = mpsc::channel::<ProbeOutcome>();

    let probe_count = probes.len() as u32;
    for payload in probes {
        let tx = tx.clone();
        pool.execute(move || {
            let outcome = run_one_probe(ip, port, &payload, connect_timeout, read_timeout);
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    let probes_sent = probe_count;
    let mut probes_received = 0u32;
    let mut candidate_reply: Option<Vec<u8>> = None;
    let mut candidate_request: Vec<u8> = Vec::new();

    for outcome in rx.iter() {
        if outcome.received {
            probes_received += 1;
            if candidate_reply.is_none() && !outcome.reply.iter().all(u8::is_ascii_whitespace) && !outcome.reply.is_empty() {
                candidate_reply = Some(outcome.reply);
                candidate_request = outcome.request;
            }
        }
    }

    let mut is_tls = false;
    let mut request = candidate_request;
    let mut reply = candidate_reply.unwrap_or_default();

    if looks_like_tls_record(&reply) {
        if let Some((tls_request, tls_reply)) = tls_probe(ip, port, connect_timeout, read_timeout) {
            is_tls = true;
            request = tls_request;
            reply = tls_reply;
            if reply.is_empty() {
                return ServiceInfo {
                    port,
                    service: "HTTPS".to_string(),
                    is_tls: true,
                    probes_sent,
                    probes_received,
                    ..Default::default()
                };
            }
        } else {
            is_tls = true;
        }
    }

    let cleaned_response = clean_response(&reply);
    let cleaned_request = clean_response(&request);
    let candidate = identify_service(&reply, &cleaned_response, is_tls);

    ServiceInfo {
        port,
        service: candidate.service.to_string(),
        request: cleaned_request,
        response: cleaned_response,
        probes_sent,
        probes_received,
        is_tls,
    }
}

#[cfg(test)]
#[path = "./service_scan_tests.rs"]
mod tests;
