use std::collections::HashMap;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_unset() {
    let cfg = RelayConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, RelayConfig::default());
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.outbox_capacity, 256);
}

#[test]
fn parses_overrides() {
    let cfg = RelayConfig::from_lookup(lookup(&[
        ("BIND_ADDR", "127.0.0.1"),
        ("PORT", " 8080 "),
        ("RELAY_OUTBOX_CAPACITY", "16"),
    ]))
    .unwrap();
    assert_eq!(cfg.bind_addr, IpAddr::from([127, 0, 0, 1]));
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.outbox_capacity, 16);
}

#[test]
fn rejects_invalid_port() {
    let err = RelayConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
    assert_eq!(err, RelayConfigError::Invalid { var: "PORT", value: "http".into() });
}

#[test]
fn rejects_zero_outbox() {
    let err = RelayConfig::from_lookup(lookup(&[("RELAY_OUTBOX_CAPACITY", "0")])).unwrap_err();
    assert!(matches!(err, RelayConfigError::Invalid { var: "RELAY_OUTBOX_CAPACITY", .. }));
}

#[test]
fn rejects_invalid_bind_addr() {
    assert!(RelayConfig::from_lookup(lookup(&[("BIND_ADDR", "localhost:1")])).is_err());
}
