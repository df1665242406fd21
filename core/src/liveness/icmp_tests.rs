use super::*;
use crate::process::MockProcessRunner;
use std::str::FromStr;

#[test]
fn reply_with_ttl_reports_alive() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.5 ms".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.1").unwrap();
    assert!(ping(&mock, ip, &PingConfig::default()));
}

#[test]
fn reply_without_ttl_reports_dead() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("Request timed out.".into(), false));

    let ip = Ipv4Addr::from_str("10.0.0.2").unwrap();
    let config = PingConfig {
        attempts: 1,
        retry_delay: 0.0,
        ..PingConfig::default()
    };
    assert!(!ping(&mock, ip, &config));
}

#[test]
fn retries_up_to_configured_attempts() {
    let mut mock = MockProcessRunner::new();
    let mut call_count = 0;
    mock.expect_run().times(3).returning(move |_, _, _| {
        call_count += 1;
        ("Request timed out.".into(), false)
    });

    let ip = Ipv4Addr::from_str("10.0.0.3").unwrap();
    let config = PingConfig {
        attempts: 3,
        retry_delay: 0.0,
        ..PingConfig::default()
    };
    assert!(!ping(&mock, ip, &config));
}

#[test]
fn ttl_match_is_case_insensitive() {
    let mut mock = MockProcessRunner::new();
    mock.expect_run()
        .returning(|_, _, _| ("reply from 10.0.0.4: TTL=128".into(), true));

    let ip = Ipv4Addr::from_str("10.0.0.4").unwrap();
    assert!(ping(&mock, ip, &PingConfig::default()));
}
