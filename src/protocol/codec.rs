//! Protocol codec
//!
//! Encoding and decoding for both wire framing variants. The codec owns a
//! session's reusable buffer and performs no I/O.
//!
//! ## Wire Format
//!
//! ### Basic fixed header (10 bytes)
//! ```text
//! ┌────────────┬──────────┬──────────────┬──────────────┐
//! │ packed (1) │ op (1)   │ payload (4)  │ req id (4)   │
//! └────────────┴──────────┴──────────────┴──────────────┘
//! ```
//!
//! ### Extended fixed header (16 bytes)
//! ```text
//! ┌────────────┬────────┬─────────────┬──────────┬────────────┬──────────┐
//! │ packed (1) │ op (1) │ payload (4) │ inst (2) │ req id (4) │ ts (4)   │
//! └────────────┴────────┴─────────────┴──────────┴────────────┴──────────┘
//! ```
//!
//! ### Payloads
//! - Key:            key_size (1) + key
//! - KeyValue:       key_size (1) + value_size (3) + key + value
//! - KeyValueUpdate: key_size (1) + update_size (3) + update_offset (3)
//!                   + key + update
//!
//! All multi-byte integers are big-endian; value sizes are 24-bit.

use bytes::BytesMut;

use crate::error::{Result, StratoError};

use super::message::{
    Correlation, Header, MessageClass, Opcode, ProtocolVariant, Role, CLASS_MASK, FROM_MASK,
    FROM_SHIFT, TO_MASK, TO_SHIFT,
};
use super::payload::{
    KeyRef, KeyValueRef, KeyValueUpdateRef, KEY_PREFIX_SIZE, KEY_VALUE_PREFIX_SIZE,
    KEY_VALUE_UPDATE_PREFIX_SIZE, MAX_KEY_SIZE, MAX_VALUE_SIZE,
};

/// Smallest buffer any session will use (64 KiB)
pub const MIN_BUFFER_SIZE: usize = 65536;

/// Buffer size for a session expecting keys up to `max_key_size` and
/// values/chunks up to `max_chunk_size`: the worst-case key-value frame,
/// rounded up to a 4 KiB boundary, then doubled, floored at 64 KiB.
pub fn suggested_buffer_size(
    variant: ProtocolVariant,
    max_key_size: usize,
    max_chunk_size: usize,
) -> usize {
    let mut size = variant.header_size() + KEY_VALUE_PREFIX_SIZE + max_key_size + max_chunk_size;
    if size & 0xFFF != 0 {
        size = ((size >> 12) + 1) << 12;
    }
    size <<= 1;
    if size < MIN_BUFFER_SIZE {
        size = MIN_BUFFER_SIZE;
    }
    size
}

/// Encoder/decoder over a single reusable buffer.
///
/// The buffer is allocated once and exclusively owned by one session;
/// decoded payload views borrow from it and must not outlive the next
/// encode or read. The `from` role of every outgoing frame is fixed at
/// construction: a client always speaks as the application.
pub struct Codec {
    variant: ProtocolVariant,
    from: Role,
    buf: BytesMut,
}

impl Codec {
    pub fn new(variant: ProtocolVariant, max_key_size: usize, max_chunk_size: usize) -> Self {
        Self {
            variant,
            from: Role::Application,
            buf: BytesMut::zeroed(suggested_buffer_size(variant, max_key_size, max_chunk_size)),
        }
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Total buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Encoded frames are read out of this slice for writing to a socket.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Sockets read incoming bytes directly into this slice.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Write the fixed header at offset 0; returns the header size.
    pub fn encode_header(
        &mut self,
        class: MessageClass,
        to: Role,
        opcode: Opcode,
        payload_len: u32,
        ids: Correlation,
    ) -> usize {
        self.buf[0] = (class as u8 & CLASS_MASK)
            | ((self.from.bits() << FROM_SHIFT) & FROM_MASK)
            | ((to.bits() << TO_SHIFT) & TO_MASK);
        self.buf[1] = opcode as u8;
        self.buf[2..6].copy_from_slice(&payload_len.to_be_bytes());

        match self.variant {
            ProtocolVariant::Basic => {
                self.buf[6..10].copy_from_slice(&ids.request_id.to_be_bytes());
            }
            ProtocolVariant::Extended => {
                self.buf[6..8].copy_from_slice(&ids.instance_id.to_be_bytes());
                self.buf[8..12].copy_from_slice(&ids.request_id.to_be_bytes());
                self.buf[12..16].copy_from_slice(&ids.timestamp.to_be_bytes());
            }
        }
        self.variant.header_size()
    }

    /// Encode a key-only frame; returns total bytes written.
    pub fn encode_key_header(
        &mut self,
        class: MessageClass,
        to: Role,
        opcode: Opcode,
        ids: Correlation,
        key: &[u8],
    ) -> Result<usize> {
        self.check_sizes(key, &[], KEY_PREFIX_SIZE)?;

        let payload_len = KEY_PREFIX_SIZE + key.len();
        let mut at = self.encode_header(class, to, opcode, payload_len as u32, ids);

        self.buf[at] = key.len() as u8;
        at += KEY_PREFIX_SIZE;

        self.buf[at..at + key.len()].copy_from_slice(key);
        Ok(at + key.len())
    }

    /// Encode a key-value frame; returns total bytes written.
    pub fn encode_key_value_header(
        &mut self,
        class: MessageClass,
        to: Role,
        opcode: Opcode,
        ids: Correlation,
        key: &[u8],
        value: &[u8],
    ) -> Result<usize> {
        self.check_sizes(key, value, KEY_VALUE_PREFIX_SIZE)?;

        let payload_len = KEY_VALUE_PREFIX_SIZE + key.len() + value.len();
        let mut at = self.encode_header(class, to, opcode, payload_len as u32, ids);

        self.buf[at] = key.len() as u8;
        put_u24(&mut self.buf[at + 1..at + 4], value.len() as u32);
        at += KEY_VALUE_PREFIX_SIZE;

        self.buf[at..at + key.len()].copy_from_slice(key);
        at += key.len();

        self.buf[at..at + value.len()].copy_from_slice(value);
        Ok(at + value.len())
    }

    /// Encode a key-value-update frame; returns total bytes written.
    pub fn encode_key_value_update_header(
        &mut self,
        class: MessageClass,
        to: Role,
        opcode: Opcode,
        ids: Correlation,
        key: &[u8],
        update: &[u8],
        update_offset: u32,
    ) -> Result<usize> {
        self.check_sizes(key, update, KEY_VALUE_UPDATE_PREFIX_SIZE)?;
        if update_offset as usize > MAX_VALUE_SIZE {
            return Err(StratoError::InvalidSize {
                what: "value update offset",
                got: update_offset as usize,
                max: MAX_VALUE_SIZE,
            });
        }

        let payload_len = KEY_VALUE_UPDATE_PREFIX_SIZE + key.len() + update.len();
        let mut at = self.encode_header(class, to, opcode, payload_len as u32, ids);

        self.buf[at] = key.len() as u8;
        put_u24(&mut self.buf[at + 1..at + 4], update.len() as u32);
        put_u24(&mut self.buf[at + 4..at + 7], update_offset);
        at += KEY_VALUE_UPDATE_PREFIX_SIZE;

        self.buf[at..at + key.len()].copy_from_slice(key);
        at += key.len();

        self.buf[at..at + update.len()].copy_from_slice(update);
        Ok(at + update.len())
    }

    /// Oversized inputs are a caller contract violation, caught before any
    /// byte is written.
    fn check_sizes(&self, key: &[u8], value: &[u8], prefix: usize) -> Result<()> {
        if key.len() > MAX_KEY_SIZE {
            return Err(StratoError::InvalidSize {
                what: "key",
                got: key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(StratoError::InvalidSize {
                what: "value",
                got: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        let total = self.variant.header_size() + prefix + key.len() + value.len();
        if total > self.buf.len() {
            return Err(StratoError::InvalidSize {
                what: "frame",
                got: total,
                max: self.buf.len(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Decode the fixed header from the first `size` buffered bytes.
    ///
    /// Every field must validate against the variant's enumerations; any
    /// unrecognized value invalidates the whole header.
    pub fn decode_header(&self, size: usize) -> Result<Header> {
        let header_size = self.variant.header_size();
        if size < header_size {
            return Err(StratoError::InvalidHeader(format!(
                "truncated header: expected {} bytes, got {}",
                header_size, size
            )));
        }

        let packed = self.buf[0];
        let class = MessageClass::from_bits(packed & CLASS_MASK)
            .filter(|c| self.variant.class_valid(*c))
            .ok_or_else(|| {
                StratoError::InvalidHeader(format!(
                    "unknown message class bits 0x{:02x}",
                    packed & CLASS_MASK
                ))
            })?;
        let from = self
            .variant
            .role_from_bits((packed & FROM_MASK) >> FROM_SHIFT)
            .ok_or_else(|| {
                StratoError::InvalidHeader(format!("unknown sender role in byte 0x{:02x}", packed))
            })?;
        let to = self
            .variant
            .role_from_bits((packed & TO_MASK) >> TO_SHIFT)
            .ok_or_else(|| {
                StratoError::InvalidHeader(format!("unknown receiver role in byte 0x{:02x}", packed))
            })?;
        let opcode = Opcode::from_byte(self.buf[1])
            .filter(|op| self.variant.opcode_valid(*op))
            .ok_or_else(|| {
                StratoError::InvalidHeader(format!("unknown opcode 0x{:02x}", self.buf[1]))
            })?;
        if !opcode.permitted_between(from, to) {
            return Err(StratoError::InvalidHeader(format!(
                "opcode {:?} not permitted between {:?} and {:?}",
                opcode, from, to
            )));
        }

        let payload_len = u32::from_be_bytes([self.buf[2], self.buf[3], self.buf[4], self.buf[5]]);
        let (instance_id, request_id, timestamp) = match self.variant {
            ProtocolVariant::Basic => (
                0,
                u32::from_be_bytes([self.buf[6], self.buf[7], self.buf[8], self.buf[9]]),
                0,
            ),
            ProtocolVariant::Extended => (
                u16::from_be_bytes([self.buf[6], self.buf[7]]),
                u32::from_be_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]]),
                u32::from_be_bytes([self.buf[12], self.buf[13], self.buf[14], self.buf[15]]),
            ),
        };

        Ok(Header {
            class,
            from,
            to,
            opcode,
            payload_len,
            request_id,
            instance_id,
            timestamp,
        })
    }

    /// Decode a key-only payload from `size` bytes starting at `offset`.
    pub fn decode_key_header(&self, size: usize, offset: usize) -> Result<KeyRef<'_>> {
        if size < KEY_PREFIX_SIZE {
            return Err(truncated_payload("key", KEY_PREFIX_SIZE, size));
        }

        let key_size = self.buf[offset] as usize;
        if size < KEY_PREFIX_SIZE + key_size {
            return Err(truncated_payload("key", KEY_PREFIX_SIZE + key_size, size));
        }

        let key_pos = offset + KEY_PREFIX_SIZE;
        Ok(KeyRef {
            key: &self.buf[key_pos..key_pos + key_size],
        })
    }

    /// Decode a key-value payload from `size` bytes starting at `offset`.
    pub fn decode_key_value_header(&self, size: usize, offset: usize) -> Result<KeyValueRef<'_>> {
        if size < KEY_VALUE_PREFIX_SIZE {
            return Err(truncated_payload("key-value", KEY_VALUE_PREFIX_SIZE, size));
        }

        let key_size = self.buf[offset] as usize;
        let value_size = get_u24(&self.buf[offset + 1..offset + 4]) as usize;
        if size < KEY_VALUE_PREFIX_SIZE + key_size + value_size {
            return Err(truncated_payload(
                "key-value",
                KEY_VALUE_PREFIX_SIZE + key_size + value_size,
                size,
            ));
        }

        let key_pos = offset + KEY_VALUE_PREFIX_SIZE;
        let value_pos = key_pos + key_size;
        Ok(KeyValueRef {
            key: &self.buf[key_pos..key_pos + key_size],
            value: &self.buf[value_pos..value_pos + value_size],
        })
    }

    /// Decode a key-value-update payload from `size` bytes at `offset`.
    ///
    /// Only the key must be present in full; confirmations echo the sizes
    /// without the update bytes.
    pub fn decode_key_value_update_header(
        &self,
        size: usize,
        offset: usize,
    ) -> Result<KeyValueUpdateRef<'_>> {
        if size < KEY_VALUE_UPDATE_PREFIX_SIZE {
            return Err(truncated_payload(
                "key-value-update",
                KEY_VALUE_UPDATE_PREFIX_SIZE,
                size,
            ));
        }

        let key_size = self.buf[offset] as usize;
        let update_size = get_u24(&self.buf[offset + 1..offset + 4]);
        let update_offset = get_u24(&self.buf[offset + 4..offset + 7]);
        if size < KEY_VALUE_UPDATE_PREFIX_SIZE + key_size {
            return Err(truncated_payload(
                "key-value-update",
                KEY_VALUE_UPDATE_PREFIX_SIZE + key_size,
                size,
            ));
        }

        let key_pos = offset + KEY_VALUE_UPDATE_PREFIX_SIZE;
        Ok(KeyValueUpdateRef {
            key: &self.buf[key_pos..key_pos + key_size],
            update_size,
            update_offset,
        })
    }
}

fn truncated_payload(shape: &str, expected: usize, got: usize) -> StratoError {
    StratoError::InvalidHeader(format!(
        "truncated {} payload: expected {} bytes, got {}",
        shape, expected, got
    ))
}

fn put_u24(buf: &mut [u8], value: u32) {
    buf[0] = (value >> 16) as u8;
    buf[1] = (value >> 8) as u8;
    buf[2] = value as u8;
}

fn get_u24(buf: &[u8]) -> u32 {
    (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2])
}
