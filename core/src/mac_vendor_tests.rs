use super::*;

#[test]
fn unassigned_prefix_resolves_to_none() {
    // locally-administered bit set, definitely not an assigned OUI
    assert_eq!(lookup("02:00:00:00:00:00"), None);
}

#[test]
fn malformed_mac_resolves_to_none() {
    assert_eq!(lookup("not-a-mac"), None);
}
