//! MAC vendor (OUI) lookup
//!
//! The IEEE OUI table is immutable for the life of the process and
//! `oui_data` keeps its own static table in memory already, so this module
//! is a thin, directly-testable wrapper rather than an eagerly-loaded
//! cache of its own.

/// Resolves the organization name registered to the OUI (first three octets)
/// of `mac`. `mac` may be colon- or dash-delimited hex, matching whatever
/// normalization [`crate::liveness::arp`] produces. Returns `None` if the
/// prefix is unassigned or `mac` doesn't parse.
pub fn lookup(mac: &str) -> Option<String> {
    oui_data::lookup(mac).map(|entry| entry.organization().to_owned())
}

#[cfg(test)]
#[path = "./mac_vendor_tests.rs"]
mod tests;
