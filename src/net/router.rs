//! Key router
//!
//! The multi-connection "direct" mode: one session per remote node, with
//! each key deterministically owned by the session its hash selects. The
//! sessions are fully independent (socket, buffer, id range), so distinct
//! keys may be driven from distinct threads as long as each thread owns
//! its session exclusively.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::id::RequestIdAllocator;
use crate::protocol::{ProtocolVariant, Role};

use super::session::{Reply, Request, Session};

const HASH_SEED: u32 = 388_650_013;
const HASH_SCALE: u32 = 388_650_179;
const HASH_HARDENER: u32 = 1_176_845_762;

/// 32-bit multiplicative rolling hash over raw key bytes.
///
/// Bytes are taken unsigned, so the result is identical on every platform
/// and across client instances: the property the router's determinism
/// rests on.
pub fn key_hash(key: &[u8]) -> u32 {
    let mut hash = HASH_SEED;
    for &byte in key {
        hash = hash.wrapping_mul(HASH_SCALE).wrapping_add(u32::from(byte));
    }
    hash ^ HASH_HARDENER
}

/// Routes each key to one of N independent sessions.
pub struct KeyRouter {
    sessions: Vec<Session>,
}

impl KeyRouter {
    /// Build one session per configured node, in node order.
    ///
    /// The caller's id range is split into equal disjoint subranges, one
    /// per session, so ids stay globally unique without shared state.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let peer = match config.variant {
            ProtocolVariant::Basic => Role::Slave,
            ProtocolVariant::Extended => Role::Client,
        };

        let count = config.nodes.len() as u32;
        let chunk = (config.to_id - config.from_id) / count;
        let sessions = config
            .nodes
            .iter()
            .enumerate()
            .map(|(i, addr)| {
                let sub_from = config.from_id + i as u32 * chunk;
                let sub_to = if i as u32 == count - 1 {
                    config.to_id
                } else {
                    sub_from + chunk
                };
                Session::new(
                    config,
                    addr.as_str(),
                    peer,
                    RequestIdAllocator::new(sub_from, sub_to),
                )
            })
            .collect();

        Ok(Self { sessions })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Index of the session owning `key`. Deterministic: repeated calls
    /// and separate routers with the same node count agree.
    pub fn session_index(&self, key: &[u8]) -> usize {
        key_hash(key) as usize % self.sessions.len()
    }

    /// Connect and register every session in index order. Any registration
    /// failure fails the whole connect; sessions opened before the failure
    /// are closed again.
    pub fn connect(&mut self) -> Result<()> {
        for i in 0..self.sessions.len() {
            if let Err(e) = self.sessions[i].connect() {
                tracing::warn!("node {} ({}) failed to register: {}", i, self.sessions[i].addr(), e);
                for session in &mut self.sessions[..i] {
                    let _ = session.disconnect();
                }
                return Err(e);
            }
        }
        tracing::debug!("connected to {} nodes", self.sessions.len());
        Ok(())
    }

    /// Close every session, reporting the first failure after all have
    /// been attempted.
    pub fn disconnect(&mut self) -> Result<()> {
        let mut first_err = None;
        for session in &mut self.sessions {
            if let Err(e) = session.disconnect() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Route one request to the session owning its key.
    pub fn execute(&mut self, request: Request<'_>) -> Result<Reply> {
        let index = self.session_index(request.key());
        tracing::trace!(index, "routing request");
        self.sessions[index].execute(request)
    }
}
