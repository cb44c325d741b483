//! Connection session
//!
//! Owns exactly one socket and executes framed request/response exchanges
//! sequentially. Sessions are single-threaded-in-use: callers must not
//! invoke `execute` concurrently on the same session.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Result, StratoError};
use crate::id::RequestIdAllocator;
use crate::protocol::{Codec, Correlation, MessageClass, Opcode, Role};

/// Session lifecycle. `Ready` is the only state in which `execute` may be
/// called; a fatal I/O error drops the session back to `Unconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Unconnected,
    Registering,
    Ready,
}

/// One client-issued operation, before framing.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Get { key: &'a [u8] },
    Set { key: &'a [u8], value: &'a [u8] },
    Update { key: &'a [u8], update: &'a [u8], offset: u32 },
    Delete { key: &'a [u8] },
}

impl Request<'_> {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::Get { .. } => Opcode::Get,
            Request::Set { .. } => Opcode::Set,
            Request::Update { .. } => Opcode::Update,
            Request::Delete { .. } => Opcode::Delete,
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Request::Get { key }
            | Request::Set { key, .. }
            | Request::Update { key, .. }
            | Request::Delete { key } => key,
        }
    }
}

/// Result of one framed exchange the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// ResponseSuccess with a matching key; carries the value for GET.
    Success(Option<Vec<u8>>),
    /// Well-formed ResponseFailure with a matching key (e.g. key absent).
    /// A normal outcome, not an error.
    Failure,
}

/// A blocking connection to one remote node.
///
/// Owns its socket, its codec buffer, and its request-id allocator; none
/// of these are shared between sessions.
pub struct Session {
    addr: String,
    /// Role addressed by every request from this session
    peer: Role,
    codec: Codec,
    ids: RequestIdAllocator,
    stream: Option<TcpStream>,
    state: SessionState,
    /// Assigned by the server during registration (extended variant)
    instance_id: u16,
    read_timeout_ms: u64,
    write_timeout_ms: u64,
}

impl Session {
    pub fn new(
        config: &ClientConfig,
        addr: impl Into<String>,
        peer: Role,
        ids: RequestIdAllocator,
    ) -> Self {
        Self {
            addr: addr.into(),
            peer,
            codec: Codec::new(config.variant, config.max_key_size, config.max_chunk_size),
            ids,
            stream: None,
            state: SessionState::Unconnected,
            instance_id: 0,
            read_timeout_ms: config.read_timeout_ms,
            write_timeout_ms: config.write_timeout_ms,
        }
    }

    /// Remote address this session talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Open the socket and perform the register handshake.
    ///
    /// Reconnecting an already-connected session closes the old socket
    /// first. Any handshake failure leaves the session unconnected.
    pub fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            self.teardown();
        }

        let stream = TcpStream::connect(&self.addr)?;
        stream.set_nodelay(true)?;
        if self.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(self.read_timeout_ms)))?;
        }
        if self.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(self.write_timeout_ms)))?;
        }
        self.stream = Some(stream);
        self.state = SessionState::Registering;

        match self.register() {
            Ok(()) => {
                self.state = SessionState::Ready;
                tracing::debug!("registered with {}", self.addr);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("registration with {} failed: {}", self.addr, e);
                self.teardown();
                Err(e)
            }
        }
    }

    /// Close the socket. Close failures are reported to the caller but the
    /// session is unconnected afterwards either way.
    pub fn disconnect(&mut self) -> Result<()> {
        let result = match self.stream.take() {
            Some(stream) => stream.shutdown(Shutdown::Both).map_err(StratoError::from),
            None => Ok(()),
        };
        self.state = SessionState::Unconnected;
        if let Err(ref e) = result {
            tracing::warn!("failed to close connection to {}: {}", self.addr, e);
        }
        result
    }

    /// Execute one framed exchange: encode, write, then block until the
    /// full response frame is read or the stream dies.
    pub fn execute(&mut self, request: Request<'_>) -> Result<Reply> {
        if self.state != SessionState::Ready {
            return Err(StratoError::NotConnected);
        }

        let id = self.ids.next_value();
        let ids = Correlation {
            request_id: id,
            instance_id: self.instance_id,
            timestamp: 0,
        };
        let frame_len = match request {
            Request::Get { key } | Request::Delete { key } => self.codec.encode_key_header(
                MessageClass::Request,
                self.peer,
                request.opcode(),
                ids,
                key,
            )?,
            Request::Set { key, value } => self.codec.encode_key_value_header(
                MessageClass::Request,
                self.peer,
                Opcode::Set,
                ids,
                key,
                value,
            )?,
            Request::Update { key, update, offset } => self.codec.encode_key_value_update_header(
                MessageClass::Request,
                self.peer,
                Opcode::Update,
                ids,
                key,
                update,
                offset,
            )?,
        };

        tracing::trace!(
            opcode = ?request.opcode(),
            request_id = id,
            "sending request to {}", self.addr
        );

        match self.round_trip(request, frame_len, id) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                // The stream is gone or mid-frame; nothing more can be
                // read from it. Correlation errors keep the socket open so
                // the caller decides whether to reconnect.
                if matches!(e, StratoError::Io(_) | StratoError::IncompleteFrame { .. }) {
                    self.teardown();
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Exchange internals
    // =========================================================================

    /// Send a zero-payload Register request and validate the reply. On the
    /// extended variant the server assigns our instance id here.
    fn register(&mut self) -> Result<()> {
        let id = self.ids.next_value();
        let ids = Correlation {
            request_id: id,
            ..Default::default()
        };
        let frame_len =
            self.codec
                .encode_header(MessageClass::Request, self.peer, Opcode::Register, 0, ids);
        self.write_frame(frame_len)?;

        let header_size = self.codec.variant().header_size();
        self.read_exact(header_size)?;
        let header = self.codec.decode_header(header_size)?;
        if header.request_id != id {
            return Err(StratoError::RequestIdMismatch {
                expected: id,
                got: header.request_id,
            });
        }
        self.instance_id = header.instance_id;

        // Keep the stream framed if the server attached a register payload.
        if header.payload_len > 0 {
            self.read_payload(header.payload_len as usize)?;
        }
        Ok(())
    }

    fn round_trip(&mut self, request: Request<'_>, frame_len: usize, id: u32) -> Result<Reply> {
        self.write_frame(frame_len)?;

        let header_size = self.codec.variant().header_size();
        self.read_exact(header_size)?;
        let header = self.codec.decode_header(header_size)?;

        // Drain the declared payload before judging the header so the
        // stream stays framed across a correlation failure.
        let payload_len = header.payload_len as usize;
        self.read_payload(payload_len)?;

        if !header.class.is_response() {
            return Err(StratoError::InvalidHeader(format!(
                "unexpected {:?} frame in response position",
                header.class
            )));
        }
        if header.request_id != id {
            return Err(StratoError::RequestIdMismatch {
                expected: id,
                got: header.request_id,
            });
        }

        if header.is_success() {
            match request {
                Request::Get { key } => {
                    let kv = self.codec.decode_key_value_header(payload_len, 0)?;
                    if !kv.matches(key) {
                        return Err(StratoError::KeyMismatch);
                    }
                    Ok(Reply::Success(Some(kv.value.to_vec())))
                }
                Request::Set { key, .. } | Request::Delete { key } => {
                    let k = self.codec.decode_key_header(payload_len, 0)?;
                    if !k.matches(key) {
                        return Err(StratoError::KeyMismatch);
                    }
                    Ok(Reply::Success(None))
                }
                Request::Update { key, .. } => {
                    let kvu = self.codec.decode_key_value_update_header(payload_len, 0)?;
                    if !kvu.matches(key) {
                        return Err(StratoError::KeyMismatch);
                    }
                    Ok(Reply::Success(None))
                }
            }
        } else {
            let k = self.codec.decode_key_header(payload_len, 0)?;
            if !k.matches(request.key()) {
                return Err(StratoError::KeyMismatch);
            }
            Ok(Reply::Failure)
        }
    }

    fn write_frame(&mut self, frame_len: usize) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(StratoError::NotConnected)?;
        stream.write_all(&self.codec.buffer()[..frame_len])?;
        Ok(())
    }

    /// Read exactly `size` bytes into the codec buffer, looping on partial
    /// reads. A read of zero bytes means the peer closed the stream.
    fn read_exact(&mut self, size: usize) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(StratoError::NotConnected)?;
        let buf = self.codec.buffer_mut();
        let mut received = 0;
        while received < size {
            let n = stream.read(&mut buf[received..size])?;
            if n == 0 {
                return Err(StratoError::IncompleteFrame {
                    expected: size,
                    got: received,
                });
            }
            received += n;
        }
        Ok(())
    }

    /// Like `read_exact`, with the declared length checked against the
    /// buffer first: a peer may not dictate a read past our capacity.
    fn read_payload(&mut self, size: usize) -> Result<()> {
        if size > self.codec.capacity() {
            return Err(StratoError::InvalidHeader(format!(
                "declared payload of {} bytes exceeds the {}-byte session buffer",
                size,
                self.codec.capacity()
            )));
        }
        self.read_exact(size)
    }

    fn teardown(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.state = SessionState::Unconnected;
    }
}
