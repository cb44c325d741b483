//! Configuration for StratoKV clients
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, StratoError};
use crate::protocol::{ProtocolVariant, MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// Main configuration for a client instance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Framing variant spoken on every connection of this client
    pub variant: ProtocolVariant,

    /// Largest key the client will send (bytes, at most 255)
    pub max_key_size: usize,

    /// Largest value/chunk the client expects to exchange (bytes);
    /// together with `max_key_size` this sizes the per-session buffer
    pub max_chunk_size: usize,

    // -------------------------------------------------------------------------
    // Node Configuration
    // -------------------------------------------------------------------------
    /// Remote node addresses (`host:port`). A single entry drives one
    /// session; multiple entries drive the key-routed "direct" mode with
    /// one session per node.
    pub nodes: Vec<String>,

    // -------------------------------------------------------------------------
    // Request ID Configuration
    // -------------------------------------------------------------------------
    /// Start of the half-open request-id range assigned to this client
    pub from_id: u32,

    /// End (exclusive) of the request-id range
    pub to_id: u32,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Socket read timeout (milliseconds, 0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = block indefinitely)
    pub write_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            variant: ProtocolVariant::Basic,
            max_key_size: MAX_KEY_SIZE,
            max_chunk_size: 4096,
            nodes: vec!["127.0.0.1:9110".to_string()],
            from_id: 0,
            to_id: u32::MAX,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check the invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(StratoError::Config("no node addresses given".to_string()));
        }
        if self.max_key_size == 0 || self.max_key_size > MAX_KEY_SIZE {
            return Err(StratoError::Config(format!(
                "max_key_size must be in 1..={} (got {})",
                MAX_KEY_SIZE, self.max_key_size
            )));
        }
        if self.max_chunk_size > MAX_VALUE_SIZE {
            return Err(StratoError::Config(format!(
                "max_chunk_size must be at most {} (got {})",
                MAX_VALUE_SIZE, self.max_chunk_size
            )));
        }
        if self.from_id >= self.to_id {
            return Err(StratoError::Config(format!(
                "request-id range [{}, {}) is empty",
                self.from_id, self.to_id
            )));
        }
        // Each session gets its own disjoint slice of the id range.
        let span = (self.to_id - self.from_id) as usize;
        if span < self.nodes.len() {
            return Err(StratoError::Config(format!(
                "request-id range [{}, {}) is too small for {} nodes",
                self.from_id,
                self.to_id,
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the framing variant
    pub fn variant(mut self, variant: ProtocolVariant) -> Self {
        self.config.variant = variant;
        self
    }

    /// Set the maximum key size (in bytes)
    pub fn max_key_size(mut self, size: usize) -> Self {
        self.config.max_key_size = size;
        self
    }

    /// Set the maximum value/chunk size (in bytes)
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.max_chunk_size = size;
        self
    }

    /// Replace the node address list
    pub fn nodes(mut self, nodes: Vec<String>) -> Self {
        self.config.nodes = nodes;
        self
    }

    /// Set a single node address
    pub fn node(mut self, addr: impl Into<String>) -> Self {
        self.config.nodes = vec![addr.into()];
        self
    }

    /// Assign the half-open request-id range `[from_id, to_id)`
    pub fn id_range(mut self, from_id: u32, to_id: u32) -> Self {
        self.config.from_id = from_id;
        self.config.to_id = to_id;
        self
    }

    /// Set the socket read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the socket write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
