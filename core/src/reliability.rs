//! A FIFO queue that serializes repeated runs of the same config, one scan
//! at a time, for reproducibility testing.
//!
//! A single worker thread blocks on a condvar until a job is queued, runs
//! it to completion through a [`ScanManager`], and records a snapshot.
//! Deliberately a pool of exactly one worker rather than the `threadpool`
//! fan-out used elsewhere in this crate, since the at-most-one-running
//! invariant is the whole point of this subsystem.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::config::ScanConfig;
use crate::scan_manager::ScanManager;

/// Clamp bounds for `enqueue`'s `repeat` parameter
const MIN_REPEAT: u32 = 1;
const MAX_REPEAT: u32 = 50;

/// Lifecycle of one queued reliability job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting its turn
    Queued,
    /// Currently driving a Scanner
    Running,
    /// Finished normally
    Completed,
    /// The Scanner reported a failure while running this job
    Error,
    /// Removed from the queue before it started running
    Cancelled,
}

/// A compact view of a scan's progress, captured once a job finishes, for
/// display without holding a reference to the underlying Scanner.
#[derive(Debug, Clone)]
pub struct ResultSnapshot {
    /// Whether the scan was still running when the snapshot was taken
    pub running: bool,
    /// Estimated completion percentage at snapshot time
    pub percent: f64,
    /// Stage name at snapshot time
    pub stage: &'static str,
    /// Wall-clock seconds the scan ran for
    pub runtime: f64,
    /// Hosts confirmed alive
    pub devices_alive: usize,
    /// Hosts whose liveness check has completed
    pub devices_scanned: usize,
    /// Total hosts the subnet expanded to
    pub devices_total: usize,
    /// Total open ports found across all devices
    pub open_ports: usize,
    /// UID of the Scanner this snapshot was taken from
    pub scan_id: String,
}

/// One entry in the reliability queue
#[derive(Debug, Clone)]
pub struct ReliabilityJob {
    /// Unique id for this job, independent of any `Scanner`'s UID
    pub id: String,
    /// The config this job will run, an independent copy per job
    pub config: ScanConfig,
    /// Caller-supplied label, for display
    pub label: Option<String>,
    /// Current lifecycle status
    pub status: JobStatus,
    /// UID of the Scanner driving this job, set once it starts running
    pub scan_id: Option<String>,
    /// Unix timestamp this job was enqueued
    pub enqueued_at: f64,
    /// Unix timestamp this job started running
    pub started_at: Option<f64>,
    /// Unix timestamp this job finished, in any terminal status
    pub completed_at: Option<f64>,
    /// Error message, set only when `status == Error`
    pub error: Option<String>,
    /// Snapshot taken at completion
    pub result_snapshot: Option<ResultSnapshot>,
}

impl ReliabilityJob {
    fn new(config: ScanConfig, label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            label,
            status: JobStatus::Queued,
            scan_id: None,
            enqueued_at: now_secs(),
            started_at: None,
            completed_at: None,
            error: None,
            result_snapshot: None,
        }
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Aggregate counts by status, for dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Jobs waiting their turn
    pub queued: usize,
    /// Jobs currently running (0 or 1, the queue's core invariant)
    pub running: usize,
    /// Jobs that finished normally
    pub completed: usize,
    /// Jobs that finished with an error
    pub error: usize,
    /// Jobs cancelled before they started
    pub cancelled: usize,
}

struct Inner {
    jobs: VecDeque<ReliabilityJob>,
    shutdown: bool,
}

/// A single-worker FIFO that runs one [`ScanConfig`] at a time through a
/// shared [`ScanManager`].
pub struct ReliabilityQueue {
    inner: Mutex<Inner>,
    condvar: Condvar,
    manager: Arc<ScanManager>,
}

impl ReliabilityQueue {
    /// Builds a queue driving scans through `manager`. Does not spawn the
    /// worker thread; call [`ReliabilityQueue::spawn_worker`] once, which
    /// callers typically do immediately after wrapping this in an `Arc`.
    pub fn new(manager: Arc<ScanManager>) -> Self {
        Self {
            inner: Mutex::new(Inner { jobs: VecDeque::new(), shutdown: false }),
            condvar: Condvar::new(),
            manager,
        }
    }

    /// Spawns the background worker thread that drains the queue. Returns
    /// the join handle so callers can shut down cleanly in tests.
    pub fn spawn_worker(self: &Arc<Self>) -> std::thread::JoinHandle<()> {
        let queue = Arc::clone(self);
        std::thread::spawn(move || queue.worker_loop())
    }

    /// Appends `repeat` (clamped to 1..=50) independent copies of `config`
    /// to the back of the queue, each its own job, and wakes the worker.
    /// Returns the ids assigned, in enqueue order.
    pub fn enqueue(&self, config: ScanConfig, label: Option<String>, repeat: u32) -> Vec<String> {
        let repeat = repeat.clamp(MIN_REPEAT, MAX_REPEAT);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let mut ids = Vec::with_capacity(repeat as usize);
        for _ in 0..repeat {
            let job = ReliabilityJob::new(config.clone(), label.clone());
            ids.push(job.id.clone());
            inner.jobs.push_back(job);
        }

        self.condvar.notify_one();
        ids
    }

    /// Removes a still-`Queued` job by id, marking it `Cancelled` in place
    /// rather than dropping it, so callers can still look it up. Returns
    /// `false` if `id` wasn't found or had already left the queued state.
    pub fn cancel(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = inner.jobs.iter_mut().find(|j| j.id == id && j.status == JobStatus::Queued) {
            job.status = JobStatus::Cancelled;
            job.completed_at = Some(now_secs());
            true
        } else {
            false
        }
    }

    /// Returns a clone of every job currently tracked, in enqueue order
    pub fn jobs(&self) -> Vec<ReliabilityJob> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.jobs.iter().cloned().collect()
    }

    /// Returns a single job by id, with `queue_position` derived as its
    /// 1-indexed offset among jobs still `Queued` (0 if not queued)
    pub fn job(&self, id: &str) -> Option<(ReliabilityJob, usize)> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut position = 0usize;
        for job in &inner.jobs {
            if job.status == JobStatus::Queued {
                position += 1;
            }
            if job.id == id {
                let queue_position = if job.status == JobStatus::Queued { position } else { 0 };
                return Some((job.clone(), queue_position));
            }
        }
        None
    }

    /// Aggregate counts across every tracked job
    pub fn get_status_counts(&self) -> StatusCounts {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts = StatusCounts::default();
        for job in &inner.jobs {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Error => counts.error += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// Signals the worker thread to exit after its current job, if any, and
    /// wakes it so it notices promptly
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.shutdown = true;
        self.condvar.notify_one();
    }

    fn worker_loop(&self) {
        loop {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if inner.shutdown {
                    return;
                }
                if inner.jobs.iter().any(|j| j.status == JobStatus::Queued) {
                    break;
                }
                inner = self.condvar.wait(inner).unwrap_or_else(|e| e.into_inner());
            }

            let index = inner.jobs.iter().position(|j| j.status == JobStatus::Queued).unwrap();
            inner.jobs[index].status = JobStatus::Running;
            inner.jobs[index].started_at = Some(now_secs());
            let config = inner.jobs[index].config.clone();
            drop(inner);

            let outcome = self.manager.new_scan(config).and_then(|scanner| {
                let scan_id = scanner.uid().to_string();
                {
                    let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                    inner.jobs[index].scan_id = Some(scan_id.clone());
                }

                while scanner.running() {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }

                let results = scanner.results();
                let open_ports: usize = results.devices.iter().map(|d| d.ports.len()).sum();
                Ok(ResultSnapshot {
                    running: scanner.running(),
                    percent: scanner.calc_percent_complete(),
                    stage: results.stage.as_str(),
                    runtime: results.end_time.unwrap_or_else(now_secs) - results.start_time,
                    devices_alive: results.devices.len(),
                    devices_scanned: results.devices_scanned,
                    devices_total: results.devices_total,
                    open_ports,
                    scan_id,
                })
            });

            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match outcome {
                Ok(snapshot) => {
                    inner.jobs[index].status = JobStatus::Completed;
                    inner.jobs[index].result_snapshot = Some(snapshot);
                }
                Err(e) => {
                    log::error!("reliability job {} failed: {e}", inner.jobs[index].id);
                    inner.jobs[index].status = JobStatus::Error;
                    inner.jobs[index].error = Some(e.to_string());
                }
            }
            inner.jobs[index].completed_at = Some(now_secs());
        }
    }
}

#[cfg(test)]
#[path = "./reliability_tests.rs"]
mod tests;
