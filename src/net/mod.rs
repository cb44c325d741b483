//! Network Module
//!
//! Blocking TCP sessions and multi-node key routing.
//!
//! ## Architecture
//! - One `Session` per remote node: one socket, one buffer, one id range
//! - Register handshake on connect, then sequential framed exchanges
//! - `KeyRouter` shards keys across N sessions by hash

mod router;
mod session;

pub use router::{key_hash, KeyRouter};
pub use session::{Reply, Request, Session};
