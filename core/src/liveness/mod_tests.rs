use super::*;
use crate::process::MockProcessRunner;
use std::str::FromStr;

#[test]
fn icmp_lookup_decides_alive_without_consulting_arp() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .withf(|program, _, _| program == "ping")
        .returning(|_, _, _| ("reply ttl=64".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.1").unwrap();
    let result = check_liveness(
        &mock,
        ip,
        &[LookupType::Icmp],
        &PingConfig::default(),
        &ArpConfig::default(),
        &PokeConfig::default(),
    );
    assert!(result.alive);
    assert_eq!(result.decided_by, Some("icmp"));
    assert!(result.macs.is_empty());
}

#[test]
fn icmp_then_arp_harvests_mac_after_deciding_alive() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .withf(|program, _, _| program == "ping")
        .returning(|_, _, _| ("reply ttl=64".into(), true));
    mock.expect_run()
        .withf(|program, _, _| program == "arp")
        .returning(|_, _, _| ("? (10.0.0.1) at aa:bb:cc:dd:ee:ff".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.1").unwrap();
    let result = check_liveness(
        &mock,
        ip,
        &[LookupType::IcmpThenArp],
        &PingConfig::default(),
        &ArpConfig::default(),
        &PokeConfig::default(),
    );
    assert!(result.alive);
    assert_eq!(result.macs, vec!["AA:BB:CC:DD:EE:FF"]);
}

#[test]
fn no_lookup_type_reports_alive_reports_dead_overall() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run().returning(|_, _, _| (String::new(), false));

    let ip = Ipv4Addr::from_str("10.0.0.9").unwrap();
    let result = check_liveness(
        &mock,
        ip,
        &[LookupType::Icmp, LookupType::Arp],
        &PingConfig::default(),
        &ArpConfig::default(),
        &PokeConfig::default(),
    );
    assert!(!result.alive);
    assert_eq!(result.decided_by, None);
}

#[test]
fn first_alive_method_wins_and_short_circuits() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .withf(|program, _, _| program == "ping")
        .times(1)
        .returning(|_, _, _| ("reply ttl=64".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.1").unwrap();
    let result = check_liveness(
        &mock,
        ip,
        &[LookupType::Icmp, LookupType::Arp],
        &PingConfig::default(),
        &ArpConfig::default(),
        &PokeConfig::default(),
    );
    assert!(result.alive);
    assert_eq!(result.decided_by, Some("icmp"));
}

#[test]
fn is_arp_supported_reflects_process_runner_availability() {
    let mut mock = MockProcessRunner::new();
    mock.expect_is_available()
        .withf(|program| program == "arp")
        .returning(|_| false);

    assert!(!is_arp_supported(&mock));
}
