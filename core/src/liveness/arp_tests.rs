use super::*;
use crate::process::MockProcessRunner;
use std::str::FromStr;

#[test]
fn extracts_colon_mac() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("? (10.0.0.1) at aa:bb:cc:dd:ee:ff on en0".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.1").unwrap();
    let macs = lookup(&mock, ip, &ArpConfig::default());
    assert_eq!(macs, vec!["AA:BB:CC:DD:EE:FF"]);
}

#[test]
fn normalizes_dash_separated_mac() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("10.0.0.2           aa-bb-cc-dd-ee-ff     dynamic".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.2").unwrap();
    let macs = lookup(&mock, ip, &ArpConfig::default());
    assert_eq!(macs, vec!["AA:BB:CC:DD:EE:FF"]);
}

#[test]
fn no_mac_in_output_returns_empty() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("no entry".into(), false));

    let ip = Ipv4Addr::from_str("10.0.0.3").unwrap();
    assert!(lookup(&mock, ip, &ArpConfig::default()).is_empty());
}

#[test]
fn multiple_macs_all_returned() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run().returning(|_, _, _| {
        (
            "aa:bb:cc:dd:ee:ff ... 11:22:33:44:55:66".into(),
            true,
        )
    });

    let ip = Ipv4Addr::from_str("10.0.0.4").unwrap();
    let macs = lookup(&mock, ip, &ArpConfig::default());
    assert_eq!(macs, vec!["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
}
