#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use parley_client::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  host: "chat.local:8080"
reconnect:
  initial_delay: 500 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.endpoint(), "ws://127.0.0.1:8080/ws");
    assert_eq!(cfg.identity.node_id, "rust-client");
    assert_eq!(cfg.identity.protocol_version, "1.0");
    assert_eq!(cfg.reconnect.initial_delay_ms, 1000);
    assert_eq!(cfg.reconnect.max_delay_ms, 30000);
}

#[test]
fn secure_endpoint() {
    let ok = r#"
version: 1
server:
  host: "chat.example.com"
  secure: true
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.endpoint(), "wss://chat.example.com/ws");
}

#[test]
fn unsupported_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn host_with_scheme_rejected() {
    let bad = r#"
version: 1
server:
  host: "ws://chat.local/ws"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn zero_queue_rejected() {
    let bad = r#"
version: 1
queues:
  event_buffer: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn reconnect_delay_grows_and_caps() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let r = &cfg.reconnect;
    assert_eq!(r.delay_ms(0), 1000);
    assert_eq!(r.delay_ms(1), 1500);
    assert_eq!(r.delay_ms(2), 2250);
    assert_eq!(r.delay_ms(20), 30000);
    assert_eq!(r.delay_ms(u32::MAX), 30000);
}
