//! # StratoKV Client
//!
//! Client-side binary wire protocol for the StratoKV distributed
//! key-value store:
//! - Framing codec for the two header variants (basic and extended)
//! - Blocking connection sessions with a register handshake
//! - Request-id correlation and key-match verification
//! - Deterministic hash routing across multiple nodes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Client Facade                           │
//! │               get / set / update / delete                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Key Router                              │
//! │          hash(key) % N   (multi-node mode only)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Session 0  │   ...    │  Session N  │
//!   │ (socket +   │          │ (socket +   │
//!   │  id range)  │          │  id range)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │            Framing Codec            │
//!   │   (per-session reusable buffer)     │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod id;
pub mod net;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Result, StratoError};
pub use protocol::ProtocolVariant;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the StratoKV client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
