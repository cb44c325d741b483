//! Protocol Module
//!
//! Defines the wire protocol spoken between a client and StratoKV nodes.
//! Two framing variants exist, chosen per client at construction time:
//!
//! ### Basic (10-byte fixed header)
//! ```text
//! ┌────────────┬────────┬──────────────┬──────────────┬─────────────┐
//! │ packed (1) │ op (1) │ length (4)   │ req id (4)   │   payload   │
//! └────────────┴────────┴──────────────┴──────────────┴─────────────┘
//! ```
//!
//! ### Extended (16-byte fixed header)
//! ```text
//! ┌────────────┬────────┬────────────┬──────────┬────────────┬────────┬─────────┐
//! │ packed (1) │ op (1) │ length (4) │ inst (2) │ req id (4) │ ts (4) │ payload │
//! └────────────┴────────┴────────────┴──────────┴────────────┴────────┴─────────┘
//! ```
//!
//! The packed byte carries the message class (bits 0-2), sender role
//! (bits 3-4), and receiver role (bits 5-6). The payload is one of three
//! shapes — key, key-value, key-value-update — selected by the opcode.

mod codec;
mod message;
mod payload;

pub use codec::{suggested_buffer_size, Codec, MIN_BUFFER_SIZE};
pub use message::{Correlation, Header, MessageClass, Opcode, ProtocolVariant, Role};
pub use payload::{
    KeyRef, KeyValueRef, KeyValueUpdateRef, KEY_PREFIX_SIZE, KEY_VALUE_PREFIX_SIZE,
    KEY_VALUE_UPDATE_PREFIX_SIZE, MAX_KEY_SIZE, MAX_VALUE_SIZE,
};
