use super::*;

#[test]
fn new_device_starts_in_found_stage() {
    let device = Device::new("10.0.0.5".into());
    assert_eq!(device.ip, "10.0.0.5");
    assert_eq!(device.stage, Some(DeviceStage::Found));
    assert!(device.macs.is_empty());
    assert!(device.ports.is_empty());
}

#[test]
fn add_mac_dedups_case_insensitively_and_preserves_order() {
    let mut device = Device::new("10.0.0.5".into());
    device.add_mac("AA:BB:CC:DD:EE:FF".into());
    device.add_mac("aa:bb:cc:dd:ee:ff".into());
    device.add_mac("11:22:33:44:55:66".into());
    assert_eq!(device.macs, vec!["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
}

#[test]
fn record_port_result_tracks_scanned_count_vs_open_set_separately() {
    let mut device = Device::new("10.0.0.5".into());
    device.record_port_result(22, true);
    device.record_port_result(80, false);

    assert!(device.ports.contains(&22));
    assert!(!device.ports.contains(&80));
    assert_eq!(device.ports_scanned, 2);
}

#[test]
fn record_service_info_populates_name_grouping_and_detail_list() {
    let mut device = Device::new("10.0.0.5".into());
    device.record_service_info(ServiceInfo {
        port: 443,
        service: "https".into(),
        is_tls: true,
        ..Default::default()
    });
    device.record_service_info(ServiceInfo {
        port: 8443,
        service: "https".into(),
        is_tls: true,
        ..Default::default()
    });

    assert_eq!(device.services.get("https"), Some(&vec![443, 8443]));
    assert_eq!(device.service_info.len(), 2);
}

#[test]
fn record_error_appends() {
    let mut device = Device::new("10.0.0.5".into());
    device.record_error("port_scan", "connection refused");
    assert_eq!(device.errors.len(), 1);
    assert_eq!(device.errors[0].source, "port_scan");
}

#[test]
fn device_round_trips_through_json() {
    let mut device = Device::new("10.0.0.5".into());
    device.add_mac("AA:BB:CC:DD:EE:FF".into());
    device.alive = Some(true);
    device.record_port_result(443, true);
    device.record_service_info(ServiceInfo {
        port: 443,
        service: "https".into(),
        is_tls: true,
        ..Default::default()
    });

    let json = serde_json::to_string(&device).unwrap();
    let back: Device = serde_json::from_str(&json).unwrap();
    assert_eq!(device, back);
}

#[test]
fn device_defaults_from_partial_json() {
    let json = r#"{"ip": "10.0.0.9"}"#;
    let device: Device = serde_json::from_str(json).unwrap();
    assert_eq!(device.ip, "10.0.0.9");
    assert!(device.ports.is_empty());
    assert!(device.stage.is_none());
}
