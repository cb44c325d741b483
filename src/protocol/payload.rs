//! Payload shapes
//!
//! The three variable-length payload layouts that follow a fixed header.
//! Decoded forms borrow from the codec's buffer: they are views over
//! `(position, length)`, never copies, and are valid only until the next
//! encode or read on the same codec.

/// Maximum key size (fits the 1-byte key size field)
pub const MAX_KEY_SIZE: usize = 255;

/// Maximum value/update size (fits the 3-byte size fields)
pub const MAX_VALUE_SIZE: usize = 16_777_215;

/// Size of the key payload prefix: key size (1)
pub const KEY_PREFIX_SIZE: usize = 1;

/// Size of the key-value payload prefix: key size (1) + value size (3)
pub const KEY_VALUE_PREFIX_SIZE: usize = 4;

/// Size of the key-value-update payload prefix:
/// key size (1) + update size (3) + update offset (3)
pub const KEY_VALUE_UPDATE_PREFIX_SIZE: usize = 7;

/// Key-only payload: carried by GET/DELETE requests, by their
/// confirmations, and by every failure response.
#[derive(Debug, Clone, Copy)]
pub struct KeyRef<'a> {
    pub key: &'a [u8],
}

impl KeyRef<'_> {
    /// Byte-for-byte comparison against the key a request was sent with;
    /// a mismatch means the stream has desynchronized.
    pub fn matches(&self, key: &[u8]) -> bool {
        self.key == key
    }
}

/// Key-value payload: carried by SET requests and GET success responses.
#[derive(Debug, Clone, Copy)]
pub struct KeyValueRef<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl KeyValueRef<'_> {
    pub fn matches(&self, key: &[u8]) -> bool {
        self.key == key
    }
}

/// Key-value-update payload: carried by UPDATE requests and their
/// confirmations. Confirmations echo the sizes but omit the update bytes,
/// so the view exposes only the declared size and offset.
#[derive(Debug, Clone, Copy)]
pub struct KeyValueUpdateRef<'a> {
    pub key: &'a [u8],
    pub update_size: u32,
    pub update_offset: u32,
}

impl KeyValueUpdateRef<'_> {
    pub fn matches(&self, key: &[u8]) -> bool {
        self.key == key
    }
}
