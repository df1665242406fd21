//! Provides helpers for managing literal (non-catalog) port target lists,
//! e.g. the free-form `--ports 22-80,443` form the CLI accepts alongside a
//! named [`crate::catalog::PortList`] entry.

use std::sync::Arc;

use crate::error::InputError;

#[derive(Debug)]
/// Represents a list of Port targets
///
/// This wrapper is used to cut down on the memory needed to store entire
/// port ranges. Rather than storing all ports in a range of 1-65535, this
/// wrapper allows the storage of just the range in string form and then
/// dynamically loops the ports in that range when needed.
///
/// # Errors
///
/// Returns an error if an item in the list does not parse to a valid port (u16)
///
/// # Examples
///
/// ```
/// # use lanscape_core::targets::ports::PortTargets;
/// let ports = PortTargets::new(vec!["1-1024".to_string()]).unwrap();
/// let mut seen = 0;
/// ports.lazy_loop(|_port| { seen += 1; Ok(()) }).unwrap();
/// assert_eq!(seen, ports.len());
/// ```
pub struct PortTargets(Vec<String>, usize);

fn loop_ports<F: FnMut(u16) -> Result<(), InputError>>(
    list: &[String],
    mut cb: F,
) -> Result<(), InputError> {
    for target in list.iter() {
        let invalid = |reason: String| InputError::InvalidConfig {
            field: "port_list".into(),
            reason: format!("'{target}': {reason}"),
        };

        if target.contains('-') {
            let parts: Vec<&str> = target.split('-').collect();
            let begin = parts[0]
                .parse::<u16>()
                .map_err(|e| invalid(e.to_string()))?;
            let end = parts[1]
                .parse::<u16>()
                .map_err(|e| invalid(e.to_string()))?;

            for port in begin..=end {
                cb(port)?;
            }
        } else {
            let port = target.parse::<u16>().map_err(|e| invalid(e.to_string()))?;

            cb(port)?;
        }
    }

    Ok(())
}

impl PortTargets {
    /// Returns a new instance of PortTargets using the provided list
    pub fn new(list: Vec<String>) -> Result<Arc<Self>, InputError> {
        let mut len = 0;
        loop_ports(&list, |_| {
            len += 1;
            Ok(())
        })?;
        Ok(Arc::new(Self(list, len)))
    }

    /// Returns true if the list is empty
    pub fn is_empty(&self) -> bool {
        self.1 == 0
    }

    /// Returns the true length of the target list. If the underlying
    /// `Vec<String>` is just `["22-24"]`, then a call to "len" will
    /// return 3
    pub fn len(&self) -> usize {
        self.1
    }

    /// loops over all targets including those that are not explicitly in the
    /// list but fall within a range defined in the list
    pub fn lazy_loop<F: FnMut(u16) -> Result<(), InputError>>(&self, cb: F) -> Result<(), InputError> {
        loop_ports(&self.0, cb)
    }

    /// Collects the expanded, deduplicated port set
    pub fn to_set(&self) -> Result<std::collections::HashSet<u16>, InputError> {
        let mut set = std::collections::HashSet::new();
        self.lazy_loop(|p| {
            set.insert(p);
            Ok(())
        })?;
        Ok(set)
    }
}

#[cfg(test)]
#[path = "./ports_tests.rs"]
mod tests;
