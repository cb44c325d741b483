//! Session Tests
//!
//! End-to-end exchanges between a client and an in-process mock node.

mod common;

use common::{MockNode, Script};
use stratokv::error::StratoError;
use stratokv::{Client, ClientConfig, ProtocolVariant};

fn client_for(addr: &str) -> Client {
    let config = ClientConfig::builder()
        .node(addr)
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build();
    Client::new(config).unwrap()
}

#[test]
fn test_set_success() {
    let node = MockNode::spawn(false, vec![Script::KeyOk]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert!(client.set("user:1", "Alice").unwrap());
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_get_returns_value() {
    let node = MockNode::spawn(false, vec![Script::Value(b"Alice".to_vec())]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert_eq!(client.get("user:1").unwrap(), Some(b"Alice".to_vec()));
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_get_missing_is_absent_not_error() {
    let node = MockNode::spawn(false, vec![Script::Fail]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert_eq!(client.get("missing").unwrap(), None);
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_request_id_mismatch_never_surfaces_value() {
    let node = MockNode::spawn(false, vec![Script::SkewId(1)]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    match client.get("user:1") {
        Err(StratoError::RequestIdMismatch { expected, got }) => {
            assert_eq!(got, expected.wrapping_add(1));
        }
        other => panic!("expected RequestIdMismatch, got {:?}", other),
    }
}

#[test]
fn test_key_mismatch_detected() {
    let node = MockNode::spawn(false, vec![Script::WrongKey]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert!(matches!(
        client.set("user:1", "Alice"),
        Err(StratoError::KeyMismatch)
    ));
}

#[test]
fn test_peer_hangup_is_incomplete_frame() {
    let node = MockNode::spawn(false, vec![Script::Hangup]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert!(matches!(
        client.get("user:1"),
        Err(StratoError::IncompleteFrame { .. })
    ));
    node.join();
}

#[test]
fn test_execute_requires_connection() {
    // Never connected; the address is not even bound.
    let mut client = client_for("127.0.0.1:9");
    assert!(matches!(
        client.set("k", "v"),
        Err(StratoError::NotConnected)
    ));
}

#[test]
fn test_update_confirmation() {
    let node = MockNode::spawn(false, vec![Script::UpdateOk]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert!(client.update("user:1", "Bo", 3).unwrap());
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_delete_reports_remote_failure() {
    let node = MockNode::spawn(false, vec![Script::Fail]);
    let mut client = client_for(&node.addr);

    client.connect().unwrap();
    assert!(!client.delete("missing").unwrap());
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_extended_variant_register_and_get() {
    let node = MockNode::spawn(true, vec![Script::Value(b"v1".to_vec()), Script::KeyOk]);
    let config = ClientConfig::builder()
        .variant(ProtocolVariant::Extended)
        .node(node.addr.as_str())
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build();
    let mut client = Client::new(config).unwrap();

    client.connect().unwrap();
    assert_eq!(client.get("k").unwrap(), Some(b"v1".to_vec()));
    assert!(client.set("k", "v2").unwrap());
    client.disconnect().unwrap();
    node.join();
}

#[test]
fn test_connect_refused_is_error() {
    // Bind a port, then drop the listener so the address refuses.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let mut client = client_for(&addr);
    assert!(matches!(client.connect(), Err(StratoError::Io(_))));
}
