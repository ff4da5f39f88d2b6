#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use boundary_broker::config;
use boundary_core::BoundaryError;

#[test]
fn deny_unknown_fields() {
    let bad = r#"
request_listen: "127.0.0.1:0"
heartbeet_ms: 250 # typo should fail
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, BoundaryError::Config(_)), "{err}");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("{}").expect("must parse");
    assert_eq!(cfg.request_listen, "127.0.0.1:0");
    assert_eq!(cfg.heartbeat_ms, 250);
}

#[test]
fn defaults_validate() {
    config::BrokerConfig::default().validate().unwrap();
}

#[test]
fn out_of_range_heartbeat_is_rejected() {
    let err = config::load_from_str("heartbeat_ms: 0").expect_err("must fail");
    assert!(err.to_string().contains("heartbeat_ms"), "{err}");
}

#[test]
fn unparsable_listen_address_is_rejected() {
    let err = config::load_from_str(r#"request_listen: "not-an-address""#).expect_err("must fail");
    assert!(err.to_string().contains("request_listen"), "{err}");
}
