use super::*;

#[test]
fn default_round_trips_through_json() {
    let config = ScanConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: ScanConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
}

#[test]
fn partial_json_fills_in_defaults() {
    let json = r#"{"subnet": "192.168.1.0/24"}"#;
    let config: ScanConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.subnet, "192.168.1.0/24");
    assert_eq!(config.port_list, "common");
    assert_eq!(config.t_multiplier, 1.0);
    assert_eq!(config.lookup_type, vec![LookupType::IcmpThenArp]);
}

#[test]
fn new_sets_subnet_and_port_list_only() {
    let config = ScanConfig::new("10.0.0.0/24".into(), "default".into());
    assert_eq!(config.subnet, "10.0.0.0/24");
    assert_eq!(config.port_list, "default");
    assert_eq!(config, ScanConfig {
        subnet: "10.0.0.0/24".into(),
        port_list: "default".into(),
        ..Default::default()
    });
}

#[test]
fn t_cnt_scales_and_floors_at_one() {
    let mut config = ScanConfig::default();
    config.t_multiplier = 0.0;
    assert_eq!(config.t_cnt(100), 1);

    config.t_multiplier = 2.0;
    assert_eq!(config.t_cnt(100), 200);
}

#[test]
fn named_defaults_resolve() {
    assert!(ScanConfig::named_default("accurate").is_some());
    assert!(ScanConfig::named_default("fast").is_some());
    assert!(ScanConfig::named_default("default").is_some());
    assert!(ScanConfig::named_default("nonexistent").is_none());
}

#[test]
fn service_scan_strategy_serializes_uppercase() {
    let json = serde_json::to_string(&ServiceScanStrategy::Aggressive).unwrap();
    assert_eq!(json, "\"AGGRESSIVE\"");
}

#[test]
fn lookup_type_serializes_uppercase() {
    let json = serde_json::to_string(&LookupType::PokeThenArp).unwrap();
    assert_eq!(json, "\"POKE_THEN_ARP\"");
}

#[test]
fn unknown_named_default_reports_none() {
    assert!(ScanConfig::named_default("turbo").is_none());
}
