use super::*;

#[test]
fn new_scan_is_immediately_retrievable_by_uid() {
    let manager = ScanManager::new();
    let config = ScanConfig::new("127.0.0.1".into(), "common".into());
    let scanner = manager.new_scan(config).unwrap();
    let uid = scanner.uid().to_string();

    let fetched = manager.get_scan(&uid).unwrap();
    assert!(fetched.is_some());
    assert_eq!(fetched.unwrap().uid(), uid);
}

#[test]
fn unknown_uid_returns_none() {
    let manager = ScanManager::new();
    assert!(manager.get_scan("does-not-exist").unwrap().is_none());
}

#[test]
fn wait_until_complete_returns_none_for_unregistered_uid() {
    let manager = ScanManager::new();
    assert!(manager.wait_until_complete("nope").unwrap().is_none());
}

#[test]
fn wait_until_complete_settles_to_a_terminal_stage() {
    let manager = ScanManager::new();
    let mut config = ScanConfig::new("192.0.2.5".into(), "common".into());
    config.task_scan_ports = false;
    config.t_multiplier = 0.01;
    config.ping_config.attempts = 1;

    let scanner = manager.new_scan(config).unwrap();
    let uid = scanner.uid().to_string();

    let finished = manager.wait_until_complete(&uid).unwrap().unwrap();
    assert!(!finished.running());
}

#[test]
fn scan_uids_reflects_registered_scans() {
    let manager = ScanManager::new();
    let a = manager.new_scan(ScanConfig::new("127.0.0.1".into(), "common".into())).unwrap();
    let b = manager.new_scan(ScanConfig::new("127.0.0.2".into(), "common".into())).unwrap();

    let uids = manager.scan_uids();
    assert!(uids.contains(&a.uid().to_string()));
    assert!(uids.contains(&b.uid().to_string()));
}

#[test]
fn terminate_scans_is_a_noop_against_an_empty_registry() {
    let manager = ScanManager::new();
    assert!(manager.terminate_scans().is_empty());
}
