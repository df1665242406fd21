//! In-memory registry of running and finished scanners, indexed by UID.
//!
//! Append-only for the life of the process: completed scans stay
//! reachable rather than being garbage collected, so a caller can always
//! look back at a finished run's results, supporting many concurrent,
//! independently addressable scans rather than one scan per process
//! invocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ScanConfig;
use crate::error::{LanscapeError, Result};
use crate::scanner::Scanner;

/// Owns every [`Scanner`] created through it, keyed by UID.
#[derive(Default)]
pub struct ScanManager {
    scanners: Mutex<HashMap<String, Arc<Scanner>>>,
}

impl ScanManager {
    /// Returns a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a [`Scanner`] for `config`, registers it, starts it on a
    /// background thread, and returns it immediately without waiting for
    /// completion.
    pub fn new_scan(&self, config: ScanConfig) -> Result<Arc<Scanner>> {
        let scanner = Arc::new(Scanner::new(config)?);
        scanner.start();

        let mut scanners = self.scanners.lock().map_err(LanscapeError::from)?;
        scanners.insert(scanner.uid().to_string(), Arc::clone(&scanner));
        Ok(scanner)
    }

    /// Returns the scanner registered under `uid`, if any
    pub fn get_scan(&self, uid: &str) -> Result<Option<Arc<Scanner>>> {
        let scanners = self.scanners.lock().map_err(LanscapeError::from)?;
        Ok(scanners.get(uid).cloned())
    }

    /// Polls `scanner.running()` until it settles, then returns the
    /// scanner. Returns `Ok(None)` if `uid` isn't registered.
    pub fn wait_until_complete(&self, uid: &str) -> Result<Option<Arc<Scanner>>> {
        let Some(scanner) = self.get_scan(uid)? else {
            return Ok(None);
        };

        while scanner.running() {
            std::thread::sleep(Duration::from_millis(100));
        }

        Ok(Some(scanner))
    }

    /// Calls `terminate()` on every scanner still running. Individual
    /// termination failures are collected rather than short-circuiting the
    /// sweep, so one stuck scan doesn't block termination of the rest.
    pub fn terminate_scans(&self) -> Vec<(String, LanscapeError)> {
        let scanners: Vec<Arc<Scanner>> = {
            let scanners = self.scanners.lock().unwrap_or_else(|e| e.into_inner());
            scanners.values().cloned().collect()
        };

        let mut failures = Vec::new();
        for scanner in scanners {
            if scanner.running() {
                if let Err(e) = scanner.terminate() {
                    failures.push((scanner.uid().to_string(), e));
                }
            }
        }
        failures
    }

    /// Returns the UIDs of every registered scan, insertion order not
    /// preserved (the registry is a `HashMap`, not a log)
    pub fn scan_uids(&self) -> Vec<String> {
        let scanners = self.scanners.lock().unwrap_or_else(|e| e.into_inner());
        scanners.keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "./scan_manager_tests.rs"]
mod tests;
