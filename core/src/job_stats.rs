//! Process-wide job tracking: how many of each job are currently running,
//! how many have finished, and a running-mean timing estimate per job name.
//!
//! This re-expresses the original's `@job_tracker` decorator (which mutated
//! per-instance dicts) as an explicit, lockable, constructor-injectable
//! collaborator with a test reset hook, rather than a bare global singleton.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

/// Smoothing factor for the running-mean timing estimate; same weight the
/// original gives a fresh sample vs. history.
const TIMING_ALPHA: f64 = 0.2;

#[derive(Debug, Default, Clone)]
struct Stats {
    running: HashMap<String, i64>,
    finished: HashMap<String, i64>,
    timing: HashMap<String, f64>,
}

/// Tracks in-flight/finished counts and mean durations for named jobs.
/// Cheap to clone (an `Arc` around a mutex internally would be redundant
/// since the process-wide instance is reached via [`JobStats::global`]);
/// callers that need an isolated instance for tests use [`JobStats::new`].
#[derive(Debug, Default)]
pub struct JobStats {
    inner: Mutex<Stats>,
}

static GLOBAL: OnceLock<JobStats> = OnceLock::new();

impl JobStats {
    /// Returns a fresh, empty instance, for tests that don't want to share
    /// the process-wide singleton
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide singleton
    pub fn global() -> &'static JobStats {
        GLOBAL.get_or_init(JobStats::default)
    }

    /// Increments the running count for `job`
    pub fn start_job(&self, job: &str) {
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *stats.running.entry(job.to_string()).or_insert(0) += 1;
    }

    /// Decrements the running count, increments finished, and folds
    /// `elapsed_secs` into the running-mean timing estimate for `job`.
    /// Called on both success and failure so `running` never leaks on error.
    pub fn finish_job(&self, job: &str, elapsed_secs: f64) {
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *stats.running.entry(job.to_string()).or_insert(0) -= 1;
        *stats.finished.entry(job.to_string()).or_insert(0) += 1;

        let entry = stats.timing.entry(job.to_string()).or_insert(elapsed_secs);
        *entry = TIMING_ALPHA * elapsed_secs + (1.0 - TIMING_ALPHA) * *entry;
    }

    /// Runs `f`, tracking it as `job`: increments running before, decrements
    /// and records finish/timing after, regardless of whether `f` panics.
    pub fn measure<T>(&self, job: &str, f: impl FnOnce() -> T) -> T {
        self.start_job(job);
        let start = Instant::now();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        self.finish_job(job, start.elapsed().as_secs_f64());
        match result {
            Ok(value) => value,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Returns the current running count for `job`
    pub fn running(&self, job: &str) -> i64 {
        let stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.running.get(job).copied().unwrap_or(0)
    }

    /// Returns the number of times `job` has finished (sample count backing
    /// the running-mean timing estimate)
    pub fn finished(&self, job: &str) -> i64 {
        let stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.finished.get(job).copied().unwrap_or(0)
    }

    /// Returns the mean duration in seconds recorded for `job`, or `default`
    /// if no samples have been recorded yet
    pub fn timing(&self, job: &str, default: f64) -> f64 {
        let stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.timing.get(job).copied().unwrap_or(default)
    }

    /// Returns a snapshot of the running-counts map, used by
    /// [`crate::scanner::Scanner::terminate`] to report residual jobs on a
    /// termination timeout
    pub fn running_snapshot(&self) -> HashMap<String, i64> {
        let stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.running.clone()
    }

    /// Clears all tracked state. Exists for test isolation against the
    /// process-wide singleton.
    pub fn clear(&self) {
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *stats = Stats::default();
    }
}

#[cfg(test)]
#[path = "./job_stats_tests.rs"]
mod tests;
