//! Expands heterogeneous IPv4 address-range syntax into a bounded host list
//!
//! Accepts a comma-separated expression where each fragment is one of:
//! CIDR (`A.B.C.D/N`), a dashed range (`A.B.C.D-A.B.C.E`), a shorthand range
//! (`A.B.C.D-E`, meaning the last octet runs from `D` to `E`), or a single
//! address.

use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::error::InputError;

/// Maximum number of addresses a single expression may expand to. Any
/// fragment that would push the cumulative count past this cap fails the
/// whole parse.
pub const MAX_ADDRESSES: usize = 10_000;

/// Result of attempting to parse an address-range expression without
/// propagating an error, mirroring the shape the HTTP layer's
/// `/api/tools/subnet/test` endpoint reports.
#[derive(Debug, Clone)]
pub struct ParseReport {
    /// Whether the expression parsed successfully
    pub valid: bool,
    /// The expanded, deduplication-preserving-order address list; empty if
    /// `valid` is false
    pub addresses: Vec<Ipv4Addr>,
    /// Human readable message; an error description if invalid, otherwise
    /// a short summary
    pub message: String,
}

/// Parses a comma-separated address-range expression into an ordered list of
/// [`Ipv4Addr`]. Fragment order is preserved; duplicates across fragments are
/// retained as the expansion produces them — callers that need a
/// deduplicated dispatch list should call [`dedup_preserve_order`].
pub fn parse(expression: &str) -> Result<Vec<Ipv4Addr>, InputError> {
    if expression.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let mut addresses = Vec::new();

    for raw_fragment in expression.split(',') {
        let fragment = raw_fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        let expanded = expand_fragment(fragment)?;

        if addresses.len() + expanded.len() > MAX_ADDRESSES {
            return Err(InputError::SubnetTooLarge {
                expression: expression.to_string(),
                cap: MAX_ADDRESSES,
            });
        }

        addresses.extend(expanded);
    }

    Ok(addresses)
}

/// Parses `expression`, returning a report instead of a `Result`. Never
/// raises; all failure detail is folded into `message`.
pub fn parse_report(expression: &str) -> ParseReport {
    match parse(expression) {
        Ok(addresses) => ParseReport {
            valid: true,
            message: format!("{} address(es)", addresses.len()),
            addresses,
        },
        Err(e) => ParseReport {
            valid: false,
            addresses: Vec::new(),
            message: e.to_string(),
        },
    }
}

/// Returns the address count `parse(expression)` would produce, or `-1` if
/// the expression is invalid. Shares the same expansion routine as `parse`
/// so this is always consistent with an actual scan.
pub fn get_address_count(expression: &str) -> i64 {
    match parse(expression) {
        Ok(addresses) => addresses.len() as i64,
        Err(_) => -1,
    }
}

/// Removes duplicate addresses while preserving first-seen order. The
/// parser itself retains duplicates; the scan dispatcher calls this before
/// fanning out liveness workers.
pub fn dedup_preserve_order(addresses: Vec<Ipv4Addr>) -> Vec<Ipv4Addr> {
    let mut seen = std::collections::HashSet::with_capacity(addresses.len());
    addresses.into_iter().filter(|ip| seen.insert(*ip)).collect()
}

fn expand_fragment(fragment: &str) -> Result<Vec<Ipv4Addr>, InputError> {
    let invalid = |reason: String| InputError::InvalidFragment {
        fragment: fragment.to_string(),
        reason,
    };

    if fragment.contains('/') {
        return expand_cidr(fragment, invalid);
    }

    if fragment.contains('-') {
        return expand_range(fragment, invalid);
    }

    let ip = Ipv4Addr::from_str(fragment).map_err(|e| invalid(e.to_string()))?;
    Ok(vec![ip])
}

fn expand_cidr(
    fragment: &str,
    invalid: impl Fn(String) -> InputError,
) -> Result<Vec<Ipv4Addr>, InputError> {
    let net = Ipv4Net::from_str(fragment).map_err(|e| invalid(e.to_string()))?;

    // Reject up front using closed-form arithmetic so an early /2 or /0
    // doesn't force materializing billions of addresses before we notice.
    let host_bits = 32 - net.prefix_len() as u32;
    let num_addresses = 1u64.checked_shl(host_bits).unwrap_or(u64::MAX);
    if num_addresses > MAX_ADDRESSES as u64 {
        return Err(InputError::SubnetTooLarge {
            expression: fragment.to_string(),
            cap: MAX_ADDRESSES,
        });
    }

    // hosts-only iteration: network and broadcast excluded for prefixes < 31
    Ok(net.hosts().collect())
}

fn expand_range(
    fragment: &str,
    invalid: impl Fn(String) -> InputError,
) -> Result<Vec<Ipv4Addr>, InputError> {
    let parts: Vec<&str> = fragment.splitn(2, '-').collect();
    if parts.len() != 2 {
        return Err(invalid("expected A.B.C.D-A.B.C.E or A.B.C.D-E".into()));
    }

    let start_str = parts[0].trim();
    let end_str = parts[1].trim();

    let start = Ipv4Addr::from_str(start_str).map_err(|e| invalid(e.to_string()))?;

    let end = if end_str.contains('.') {
        Ipv4Addr::from_str(end_str).map_err(|e| invalid(e.to_string()))?
    } else {
        // shorthand: A.B.C.D-E means the last octet runs D..=E
        let last_octet: u8 = end_str
            .parse()
            .map_err(|_| invalid(format!("'{end_str}' is not a valid last octet")))?;
        let octets = start.octets();
        Ipv4Addr::new(octets[0], octets[1], octets[2], last_octet)
    };

    let start_u32 = u32::from(start);
    let end_u32 = u32::from(end);

    if end_u32 < start_u32 {
        return Err(invalid(format!(
            "range end {end} is before range start {start}"
        )));
    }

    let count = (end_u32 - start_u32 + 1) as usize;
    if count > MAX_ADDRESSES {
        return Err(InputError::SubnetTooLarge {
            expression: fragment.to_string(),
            cap: MAX_ADDRESSES,
        });
    }

    Ok((start_u32..=end_u32).map(Ipv4Addr::from).collect())
}

#[cfg(test)]
#[path = "./ip_parser_tests.rs"]
mod tests;
