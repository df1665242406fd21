use super::*;

#[test]
fn connect_refused_on_all_well_known_ports_reports_dead() {
    // 192.0.2.0/24 is TEST-NET-1, reserved and non-routable: connect should
    // fail fast rather than hang, keeping this test quick.
    let ip = "192.0.2.1".parse().unwrap();
    let config = PokeConfig {
        timeout: 0.05,
        retries: 1,
    };
    assert!(!poke(ip, &config));
}

#[test]
fn zero_retries_is_treated_as_one_attempt() {
    let ip = "192.0.2.2".parse().unwrap();
    let config = PokeConfig {
        timeout: 0.05,
        retries: 0,
    };
    // retries.max(1) means this still attempts once rather than a no-op
    assert!(!poke(ip, &config));
}
