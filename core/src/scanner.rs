//! The scan stage machine: turns a [`ScanConfig`] into a live, inspectable
//! [`ScanResults`] by fanning out liveness, metadata, port, and service
//! probing across bounded worker pools, generalized from a single
//! packet-capture pass into a multi-stage pipeline that runs on a
//! background thread behind `Scanner::start`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, error, warn};
use threadpool::ThreadPool;
use uuid::Uuid;

use crate::catalog;
use crate::config::ScanConfig;
use crate::device::{Device, DeviceStage};
use crate::error::{LanscapeError, Result, TerminationFailure};
use crate::job_stats::JobStats;
use crate::liveness;
use crate::metadata;
use crate::port_scan;
use crate::process::{ProcessRunner, SystemProcessRunner};
use crate::service_scan;

const JOB_LIVENESS: &str = "liveness_and_metadata";
const JOB_PORT_TEST: &str = "test_port";

/// Coarse phase of a scan, exposed for progress reporting and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Created, not yet started
    Instantiated,
    /// Liveness + metadata workers running
    ScanningDevices,
    /// Port scan workers running
    TestingPorts,
    /// Service scan workers running
    ServiceScanning,
    /// All requested stages finished normally
    Complete,
    /// `terminate()` called, waiting for in-flight jobs to drain
    Terminating,
    /// `terminate()` finished draining
    Terminated,
}

impl Stage {
    /// Returns the display name for this stage
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Instantiated => "instantiated",
            Stage::ScanningDevices => "scanning devices",
            Stage::TestingPorts => "testing ports",
            Stage::ServiceScanning => "service scanning",
            Stage::Complete => "complete",
            Stage::Terminating => "terminating",
            Stage::Terminated => "terminated",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Terminated)
    }
}

/// A non-fatal per-scan error recorded on [`ScanResults`], distinct from a
/// per-device [`crate::device::DeviceErrorInfo`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanErrorInfo {
    /// Which stage produced the failure
    pub source: String,
    /// Human readable message
    pub message: String,
}

/// Live, inspectable results of a scan in progress or finished.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScanResults {
    /// Unique id for this scan
    pub uid: String,
    /// The address-range expression that was scanned
    pub subnet: String,
    /// The port list name that was scanned
    pub port_list: String,
    /// Effective liveness worker count, for display
    pub parallelism: usize,
    /// Total hosts the subnet expanded to
    pub devices_total: usize,
    /// Hosts whose liveness check has completed (alive or not)
    pub devices_scanned: usize,
    /// Hosts confirmed alive, appended as found
    pub devices: Vec<Device>,
    /// Unix timestamp the scan started
    pub start_time: f64,
    /// Unix timestamp the scan finished, `None` while running
    pub end_time: Option<f64>,
    /// Current stage
    pub stage: Stage,
    /// Per-scan errors
    pub errors: Vec<ScanErrorInfo>,
    /// Degraded-mode warnings, e.g. ARP unsupported
    pub warnings: Vec<String>,
}

impl ScanResults {
    fn new(uid: String, config: &ScanConfig, devices_total: usize, parallelism: usize) -> Self {
        Self {
            uid,
            subnet: config.subnet.clone(),
            port_list: config.port_list.clone(),
            parallelism,
            devices_total,
            devices_scanned: 0,
            devices: Vec::new(),
            start_time: now_secs(),
            end_time: None,
            stage: Stage::Instantiated,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether the scan is still doing work
    pub fn running(&self) -> bool {
        !self.stage.is_terminal()
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Owns the background worker and the shared, lockable [`ScanResults`] for
/// one scan run.
pub struct Scanner {
    uid: String,
    config: ScanConfig,
    results: Arc<RwLock<ScanResults>>,
    running_flag: Arc<AtomicBool>,
    job_stats: Arc<JobStats>,
    process_runner: Arc<dyn ProcessRunner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scanner {
    /// Builds a new, unstarted scanner for `config`. Expands the subnet
    /// immediately so `devices_total` is known up front.
    pub fn new(config: ScanConfig) -> Result<Self> {
        Self::with_process_runner(config, Arc::new(SystemProcessRunner))
    }

    /// Builds a scanner with an injected [`ProcessRunner`], the seam tests
    /// use to avoid spawning real `ping`/`arp` processes.
    pub fn with_process_runner(config: ScanConfig, process_runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        let addresses = crate::ip_parser::parse(&config.subnet)?;
        let addresses = crate::ip_parser::dedup_preserve_order(addresses);
        let devices_total = addresses.len();

        let uid = Uuid::new_v4().to_string();
        let parallelism = config.isalive_workers();
        let results = ScanResults::new(uid.clone(), &config, devices_total, parallelism);

        let mut warnings = Vec::new();
        if config.lookup_type.iter().any(|l| matches!(l, crate::config::LookupType::Arp | crate::config::LookupType::PokeThenArp | crate::config::LookupType::IcmpThenArp))
            && !liveness::is_arp_supported(process_runner.as_ref())
        {
            warnings.push("arp is unavailable on this host; ARP-dependent lookups will degrade to no MAC data".to_string());
        }

        let mut results = results;
        results.warnings = warnings;
        let _ = addresses; // only needed above to compute devices_total

        Ok(Self {
            uid,
            config,
            results: Arc::new(RwLock::new(results)),
            running_flag: Arc::new(AtomicBool::new(true)),
            job_stats: Arc::new(JobStats::new()),
            process_runner,
            worker: Mutex::new(None),
        })
    }

    /// Returns this scan's unique id
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns a snapshot of the current results
    pub fn results(&self) -> ScanResults {
        self.results.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether the scan is still running
    pub fn running(&self) -> bool {
        self.running_flag.load(Ordering::SeqCst) && !self.results().stage.is_terminal()
    }

    /// Starts the scan on a background thread. Idempotent only in the sense
    /// that calling it twice spawns two worker threads against the same
    /// results; callers are expected to call this exactly once, matching
    /// [`crate::scan_manager::ScanManager::new_scan`]'s contract.
    pub fn start(self: &Arc<Self>) {
        let scanner = Arc::clone(self);
        let handle = thread::spawn(move || scanner.run());
        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn set_stage(&self, stage: Stage) {
        debug!("scan {} entering stage {}", self.uid, stage.as_str());
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.stage = stage;
        if stage.is_terminal() {
            results.end_time = Some(now_secs());
        }
    }

    fn record_scan_error(&self, source: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("scan {} {source} error: {message}", self.uid);
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.errors.push(ScanErrorInfo { source: source.to_string(), message });
    }

    fn is_terminating(&self) -> bool {
        !self.running_flag.load(Ordering::SeqCst)
    }

    fn run(&self) {
        self.set_stage(Stage::ScanningDevices);

        let Ok(addresses) = crate::ip_parser::parse(&self.config.subnet) else {
            self.record_scan_error("input", "subnet failed to re-parse at scan start");
            self.set_stage(Stage::Complete);
            return;
        };
        let addresses = crate::ip_parser::dedup_preserve_order(addresses);

        self.run_liveness_stage(&addresses);

        if self.is_terminating() {
            self.set_stage(Stage::Terminated);
            return;
        }

        if self.config.task_scan_ports {
            self.set_stage(Stage::TestingPorts);
            if let Err(e) = self.run_port_scan_stage() {
                self.record_scan_error("port_scan", e.to_string());
            }
        }

        if self.is_terminating() {
            self.set_stage(Stage::Terminated);
            return;
        }

        if self.config.task_scan_ports && self.config.task_scan_port_services {
            self.set_stage(Stage::ServiceScanning);
            self.run_service_scan_stage();
        }

        if self.is_terminating() {
            self.set_stage(Stage::Terminated);
        } else {
            self.finalize_device_stages();
            self.set_stage(Stage::Complete);
        }
    }

    fn run_liveness_stage(&self, addresses: &[std::net::Ipv4Addr]) {
        let pool = ThreadPool::new(self.config.isalive_workers().max(1));
        let (tx, rx) = mpsc::channel::<Device>();

        for &ip in addresses {
            if self.is_terminating() {
                break;
            }

            let tx = tx.clone();
            let config = self.config.clone();
            let job_stats = Arc::clone(&self.job_stats);
            let process_runner = Arc::clone(&self.process_runner);
            let terminating = Arc::clone(&self.running_flag);

            pool.execute(move || {
                if !terminating.load(Ordering::SeqCst) {
                    return;
                }

                let device = job_stats.measure(JOB_LIVENESS, || {
                    get_host_details(ip, &config, process_runner.as_ref())
                });
                let _ = tx.send(device);
            });
        }
        drop(tx);

        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        for device in rx.iter() {
            results.devices_scanned += 1;
            if device.stage == Some(DeviceStage::Found) {
                results.devices.push(device);
            }
        }
    }

    fn run_port_scan_stage(&self) -> Result<()> {
        let ports = catalog::resolve_ports(&self.config.port_list)?;

        if ports.is_empty() {
            return Ok(());
        }

        let devices: Vec<Device> = {
            let results = self.results.read().unwrap_or_else(|e| e.into_inner());
            results.devices.clone()
        };

        let device_pool = ThreadPool::new(self.config.port_scan_workers().max(1));
        let (tx, rx) = mpsc::channel::<(String, Vec<port_scan::PortResult>)>();

        for device in &devices {
            if self.is_terminating() {
                break;
            }

            let ip: std::net::Ipv4Addr = match device.ip.parse() {
                Ok(ip) => ip,
                Err(_) => continue,
            };
            let ports = ports.clone();
            let tx = tx.clone();
            let config = self.config.port_scan_config;
            let workers = self.config.port_test_workers();
            let job_stats = Arc::clone(&self.job_stats);
            let ip_key = device.ip.clone();

            device_pool.execute(move || {
                let result = job_stats.measure(JOB_PORT_TEST, || {
                    port_scan::scan_device(ip, &ports, workers, &config)
                });
                let _ = tx.send((ip_key, result));
            });
        }
        drop(tx);

        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        for (ip_key, port_results) in rx.iter() {
            if let Some(device) = results.devices.iter_mut().find(|d| d.ip == ip_key) {
                for result in port_results {
                    device.record_port_result(result.port, result.open);
                }
                if device.stage == Some(DeviceStage::Found) {
                    device.stage = Some(DeviceStage::Scanning);
                }
            }
        }

        Ok(())
    }

    fn run_service_scan_stage(&self) {
        let targets: Vec<(String, std::net::Ipv4Addr, u16)> = {
            let results = self.results.read().unwrap_or_else(|e| e.into_inner());
            results
                .devices
                .iter()
                .flat_map(|d| {
                    let ip: Option<std::net::Ipv4Addr> = d.ip.parse().ok();
                    d.ports.iter().filter_map(move |p| ip.map(|ip| (d.ip.clone(), ip, *p))).collect::<Vec<_>>()
                })
                .collect()
        };

        if targets.is_empty() {
            return;
        }

        let pool = ThreadPool::new(self.config.port_scan_workers().max(1));
        let (tx, rx) = mpsc::channel::<(String, crate::device::ServiceInfo)>();

        for (ip_key, ip, port) in targets {
            if self.is_terminating() {
                break;
            }
            let tx = tx.clone();
            let config = self.config.service_scan_config;

            pool.execute(move || {
                let info = service_scan::scan_service(ip, port, &config);
                let _ = tx.send((ip_key, info));
            });
        }
        drop(tx);

        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        for (ip_key, info) in rx.iter() {
            if let Some(device) = results.devices.iter_mut().find(|d| d.ip == ip_key) {
                device.record_service_info(info);
            }
        }
    }

    /// Promotes every alive, non-errored device still sitting in `Found` or
    /// `Scanning` to `Complete` as the scan itself finishes, so a device
    /// reaches its terminal stage even when port/service scanning was
    /// skipped entirely.
    fn finalize_device_stages(&self) {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        for device in &mut results.devices {
            if matches!(device.stage, Some(DeviceStage::Found) | Some(DeviceStage::Scanning)) {
                device.stage = Some(DeviceStage::Complete);
            }
        }
    }

    /// Flips the cooperative cancellation flag and waits up to 10 seconds
    /// (20 × 0.5s polls) for in-flight jobs to drain. Raises
    /// [`TerminationFailure`] with the residual running map on timeout.
    pub fn terminate(&self) -> Result<()> {
        self.set_stage(Stage::Terminating);
        self.running_flag.store(false, Ordering::SeqCst);

        for _ in 0..20 {
            let running = self.job_stats.running_snapshot();
            if running.values().all(|&count| count <= 0) {
                self.set_stage(Stage::Terminated);
                return Ok(());
            }
            thread::sleep(Duration::from_millis(500));
        }

        let running = self.job_stats.running_snapshot();
        error!("scan {} failed to drain running jobs within the grace window: {running:?}", self.uid);
        Err(LanscapeError::from(TerminationFailure { running }))
    }

    /// Estimates completion percentage from per-job running-mean timings:
    /// `remaining = remaining_liveness + remaining_port`, weighed against
    /// elapsed wall-clock time as the "work already done" side of the
    /// ratio, since nothing upstream hands this a fixed total to begin
    /// with.
    pub fn calc_percent_complete(&self) -> f64 {
        let results = self.results();
        if results.stage == Stage::Complete {
            return 100.0;
        }

        let devices_total = results.devices_total as f64;
        let devices_scanned = results.devices_scanned as f64;

        let avg_isalive = self.job_stats.timing(JOB_LIVENESS, 4.5);
        let isalive_workers = self.config.isalive_workers().max(1) as f64;
        let remaining_liveness = (devices_total - devices_scanned).max(0.0) * avg_isalive / isalive_workers;

        let alive_frac = (results.devices.len() as f64 / devices_scanned.max(1.0)).max(0.1);
        let est_alive = alive_frac * devices_total;

        let remaining_port = if self.config.task_scan_ports {
            let port_test_samples = self.job_stats.finished(JOB_PORT_TEST);
            let avg_port_test = if port_test_samples >= 20 {
                self.job_stats.timing(JOB_PORT_TEST, 1.0)
            } else {
                1.0
            };
            let configured_ports = catalog::resolve_ports(&self.config.port_list)
                .map(|p| p.len())
                .unwrap_or(0) as f64;
            let port_workers = (self.config.port_scan_workers() * self.config.port_test_workers()).max(1) as f64;

            (est_alive * configured_ports - port_test_samples as f64).max(0.0) * avg_port_test / port_workers
        } else {
            0.0
        };

        let elapsed = (now_secs() - results.start_time).max(0.0);
        let remaining = remaining_liveness + remaining_port;
        let total_estimated = elapsed + remaining;

        if total_estimated <= 0.0 {
            return 0.0;
        }

        (100.0 * (1.0 - remaining / total_estimated)).clamp(0.0, 99.0)
    }
}

fn get_host_details(ip: std::net::Ipv4Addr, config: &ScanConfig, process_runner: &dyn ProcessRunner) -> Device {
    let liveness_result = liveness::check_liveness(
        process_runner,
        ip,
        &config.lookup_type,
        &config.ping_config,
        &config.arp_config,
        &config.poke_config,
    );

    let mut device = Device::new(ip.to_string());
    device.alive = Some(liveness_result.alive);

    if !liveness_result.alive {
        device.stage = Some(DeviceStage::Complete);
        return device;
    }

    for mac in liveness_result.macs {
        device.add_mac(mac);
    }

    metadata::enrich(&mut device);
    device.stage = Some(DeviceStage::Found);
    device
}

#[cfg(test)]
#[path = "./scanner_tests.rs"]
mod tests;
