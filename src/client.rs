//! Client facade
//!
//! The public API: get/set/update/delete against one node or a hash-routed
//! set of nodes, behind a single type.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::id::RequestIdAllocator;
use crate::net::{KeyRouter, Reply, Request, Session};
use crate::protocol::{ProtocolVariant, Role};

/// Where requests go: one session, or a router over several.
enum Backend {
    Single(Session),
    Routed(KeyRouter),
}

/// A StratoKV client.
///
/// One configured node gives a single session (the basic variant
/// addresses a master node, the extended variant a client node); several
/// nodes give the key-routed direct mode, one session per node.
///
/// Methods take `&mut self`: a client is single-threaded-in-use, with no
/// internal locking. Remote failures (e.g. key absent) are `Ok(None)` /
/// `Ok(false)`; errors are reserved for connection, framing, and
/// correlation problems, which are never retried internally.
pub struct Client {
    backend: Backend,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let backend = if config.nodes.len() == 1 {
            let peer = match config.variant {
                ProtocolVariant::Basic => Role::Master,
                ProtocolVariant::Extended => Role::Client,
            };
            let ids = RequestIdAllocator::new(config.from_id, config.to_id);
            let addr = config.nodes[0].clone();
            Backend::Single(Session::new(&config, addr, peer, ids))
        } else {
            Backend::Routed(KeyRouter::new(&config)?)
        };
        Ok(Self { backend })
    }

    /// Connect and register with every configured node.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Single(session) => session.connect(),
            Backend::Routed(router) => router.connect(),
        }
    }

    /// Close all connections.
    pub fn disconnect(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Single(session) => session.disconnect(),
            Backend::Routed(router) => router.disconnect(),
        }
    }

    /// Fetch the value stored under `key`; `Ok(None)` when the server
    /// reports the key absent.
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        match self.execute(Request::Get { key: key.as_ref() })? {
            Reply::Success(value) => Ok(value),
            Reply::Failure => Ok(None),
        }
    }

    /// Store `value` under `key`; `Ok(false)` reports a remote failure.
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<bool> {
        let reply = self.execute(Request::Set {
            key: key.as_ref(),
            value: value.as_ref(),
        })?;
        Ok(matches!(reply, Reply::Success(_)))
    }

    /// Overwrite `update.len()` bytes of the stored value at `offset`;
    /// `Ok(false)` reports a remote failure.
    pub fn update(
        &mut self,
        key: impl AsRef<[u8]>,
        update: impl AsRef<[u8]>,
        offset: u32,
    ) -> Result<bool> {
        let reply = self.execute(Request::Update {
            key: key.as_ref(),
            update: update.as_ref(),
            offset,
        })?;
        Ok(matches!(reply, Reply::Success(_)))
    }

    /// Remove `key`; `Ok(false)` reports a remote failure (e.g. absent).
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        let reply = self.execute(Request::Delete { key: key.as_ref() })?;
        Ok(matches!(reply, Reply::Success(_)))
    }

    fn execute(&mut self, request: Request<'_>) -> Result<Reply> {
        match &mut self.backend {
            Backend::Single(session) => session.execute(request),
            Backend::Routed(router) => router.execute(request),
        }
    }
}
