//! Key Router Tests
//!
//! Hash determinism and multi-node routing against mock nodes.

mod common;

use common::{MockNode, Script};
use stratokv::error::StratoError;
use stratokv::net::{key_hash, KeyRouter};
use stratokv::{Client, ClientConfig};

fn routed_config(addrs: Vec<String>) -> ClientConfig {
    ClientConfig::builder()
        .nodes(addrs)
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build()
}

#[test]
fn test_hash_is_deterministic() {
    for key in [b"k".as_slice(), b"user:1", b"", b"\x00\xff\x80"] {
        assert_eq!(key_hash(key), key_hash(key));
    }
    // Repeated modulo selection is stable within a process.
    let first = key_hash(b"k") as usize % 3;
    for _ in 0..100 {
        assert_eq!(key_hash(b"k") as usize % 3, first);
    }
}

#[test]
fn test_separate_routers_agree() {
    let addrs: Vec<String> = (0..3).map(|i| format!("127.0.0.1:{}", 9110 + i)).collect();
    let a = KeyRouter::new(&routed_config(addrs.clone())).unwrap();
    let b = KeyRouter::new(&routed_config(addrs)).unwrap();

    for key in [b"alpha".as_slice(), b"beta", b"user:1", b"k"] {
        assert_eq!(a.session_index(key), b.session_index(key));
        assert_eq!(a.session_index(key), key_hash(key) as usize % 3);
    }
}

#[test]
fn test_routed_set_reaches_owning_node() {
    let owner = key_hash(b"user:1") as usize % 3;
    let nodes: Vec<MockNode> = (0..3)
        .map(|i| {
            let scripts = if i == owner {
                vec![Script::KeyOk, Script::KeyOk]
            } else {
                vec![]
            };
            MockNode::spawn(false, scripts)
        })
        .collect();
    let addrs = nodes.iter().map(|n| n.addr.clone()).collect();

    let mut client = Client::new(routed_config(addrs)).unwrap();
    client.connect().unwrap();

    // Both exchanges must land on the same session; any other node would
    // leave the request unanswered.
    assert!(client.set("user:1", "Alice").unwrap());
    assert!(client.set("user:1", "Bob").unwrap());

    client.disconnect().unwrap();
    for node in nodes {
        node.join();
    }
}

#[test]
fn test_keys_spread_and_stay_put() {
    let keys: Vec<String> = (0..32).map(|i| format!("key:{}", i)).collect();
    let addrs: Vec<String> = (0..3).map(|i| format!("10.0.0.{}:9110", i)).collect();
    let router = KeyRouter::new(&routed_config(addrs)).unwrap();

    for key in &keys {
        let index = router.session_index(key.as_bytes());
        assert!(index < router.session_count());
        for _ in 0..10 {
            assert_eq!(router.session_index(key.as_bytes()), index);
        }
    }
}

#[test]
fn test_connect_fails_if_any_node_refuses() {
    let good_a = MockNode::spawn(false, vec![]);
    let good_b = MockNode::spawn(false, vec![]);

    // Bind then drop so the third address refuses connections.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let addrs = vec![good_a.addr.clone(), good_b.addr.clone(), dead_addr];
    let mut client = Client::new(routed_config(addrs)).unwrap();
    assert!(matches!(client.connect(), Err(StratoError::Io(_))));
}
