use super::*;
use crate::config::{LookupType, PortScanConfig, ScanConfig};
use crate::process::MockProcessRunner;
use std::net::TcpListener;
use std::time::Duration;

fn wait_until_done(scanner: &Arc<Scanner>, max_wait: Duration) {
    let deadline = std::time::Instant::now() + max_wait;
    while scanner.running() && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
}

fn alive_mock() -> MockProcessRunner {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("64 bytes from 127.0.0.1: icmp_seq=1 ttl=64".into(), true));
    mock
}

#[test]
fn scan_finds_localhost_and_open_port() {
    let listener = TcpListener::bind("127.0.0.1:8080");
    let Ok(listener) = listener else {
        // port already in use in this environment; skip rather than flake
        return;
    };

    let config = ScanConfig {
        subnet: "127.0.0.1".into(),
        port_list: "common".into(),
        t_multiplier: 0.01,
        task_scan_ports: true,
        task_scan_port_services: false,
        lookup_type: vec![LookupType::Icmp],
        port_scan_config: PortScanConfig { timeout: 0.2, retries: 0, retry_delay: 0.0 },
        ..ScanConfig::default()
    };

    let scanner = Arc::new(Scanner::with_process_runner(config, Arc::new(alive_mock())).unwrap());
    scanner.start();
    wait_until_done(&scanner, Duration::from_secs(15));

    let results = scanner.results();
    assert_eq!(results.stage, Stage::Complete);
    assert_eq!(results.devices.len(), 1);
    assert_eq!(results.devices[0].ip, "127.0.0.1");
    assert_eq!(results.devices[0].alive, Some(true));
    assert!(results.devices[0].ports.contains(&8080));
    assert_eq!(results.devices[0].stage, Some(crate::device::DeviceStage::Complete));
    assert_eq!(results.devices_scanned, results.devices_total);
    assert_eq!(scanner.calc_percent_complete(), 100.0);

    drop(listener);
}

#[test]
fn dead_host_yields_no_devices() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run().returning(|_, _, _| ("Request timed out.".into(), false));

    let config = ScanConfig {
        subnet: "192.0.2.1".into(),
        t_multiplier: 0.01,
        task_scan_ports: false,
        lookup_type: vec![LookupType::Icmp],
        ping_config: crate::config::PingConfig { attempts: 1, ..Default::default() },
        ..ScanConfig::default()
    };

    let scanner = Arc::new(Scanner::with_process_runner(config, Arc::new(mock)).unwrap());
    scanner.start();
    wait_until_done(&scanner, Duration::from_secs(10));

    let results = scanner.results();
    assert_eq!(results.stage, Stage::Complete);
    assert!(results.devices.is_empty());
    assert_eq!(results.devices_scanned, 1);
}

#[test]
fn arp_lookup_without_arp_support_records_a_warning() {
    let mut mock = MockProcessRunner::new();
    mock.expect_is_available().returning(|_| false);

    let config = ScanConfig {
        subnet: "127.0.0.1".into(),
        lookup_type: vec![LookupType::Arp],
        ..ScanConfig::default()
    };

    let scanner = Scanner::with_process_runner(config, Arc::new(mock)).unwrap();
    assert!(!scanner.results().warnings.is_empty());
}

#[test]
fn terminate_before_start_succeeds_immediately() {
    let config = ScanConfig {
        subnet: "127.0.0.1".into(),
        ..ScanConfig::default()
    };
    let scanner = Scanner::new(config).unwrap();
    assert!(scanner.terminate().is_ok());
    assert_eq!(scanner.results().stage, Stage::Terminated);
}

#[test]
fn each_scan_gets_a_unique_uid() {
    let a = Scanner::new(ScanConfig { subnet: "127.0.0.1".into(), ..ScanConfig::default() }).unwrap();
    let b = Scanner::new(ScanConfig { subnet: "127.0.0.1".into(), ..ScanConfig::default() }).unwrap();
    assert_ne!(a.uid(), b.uid());
}

#[test]
fn stage_as_str_matches_expected_names() {
    assert_eq!(Stage::Instantiated.as_str(), "instantiated");
    assert_eq!(Stage::ScanningDevices.as_str(), "scanning devices");
    assert_eq!(Stage::TestingPorts.as_str(), "testing ports");
    assert_eq!(Stage::ServiceScanning.as_str(), "service scanning");
    assert_eq!(Stage::Complete.as_str(), "complete");
    assert_eq!(Stage::Terminating.as_str(), "terminating");
    assert_eq!(Stage::Terminated.as_str(), "terminated");
}

#[test]
fn devices_total_reflects_subnet_expansion() {
    let config = ScanConfig {
        subnet: "127.0.0.1,127.0.0.2".into(),
        ..ScanConfig::default()
    };
    let scanner = Scanner::new(config).unwrap();
    assert_eq!(scanner.results().devices_total, 2);
}

#[test]
fn invalid_subnet_is_rejected_at_construction() {
    let config = ScanConfig {
        subnet: "not-an-ip".into(),
        ..ScanConfig::default()
    };
    assert!(Scanner::new(config).is_err());
}

#[test]
fn percent_complete_starts_near_zero() {
    let config = ScanConfig {
        subnet: "127.0.0.1".into(),
        ..ScanConfig::default()
    };
    let scanner = Scanner::new(config).unwrap();
    assert!(scanner.calc_percent_complete() < 5.0);
}
