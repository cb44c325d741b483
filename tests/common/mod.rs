//! In-process mock node speaking the StratoKV wire protocol.
//!
//! Frames are built and parsed by hand here, independently of the crate's
//! codec, so the client is exercised against the wire format itself
//! rather than against its own encoder.

// Not every test target uses every helper.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Instance id the mock assigns during registration (extended variant).
pub const MOCK_INSTANCE_ID: u16 = 42;

/// Scripted reply behaviors, consumed one per request after the automatic
/// register exchange.
pub enum Script {
    /// ResponseSuccess with a key-only payload echoing the request key.
    KeyOk,
    /// ResponseSuccess with the request key and this value.
    Value(Vec<u8>),
    /// ResponseSuccess echoing an update confirmation (sizes, no bytes).
    UpdateOk,
    /// ResponseFailure with a key-only payload echoing the request key.
    Fail,
    /// ResponseSuccess, but with the request id skewed by this delta.
    SkewId(u32),
    /// ResponseSuccess carrying a key that is not the request key.
    WrongKey,
    /// Close the connection without replying.
    Hangup,
}

pub struct MockNode {
    pub addr: String,
    handle: JoinHandle<()>,
}

impl MockNode {
    /// Bind an ephemeral port and serve one connection with the given
    /// script, then drain until the client hangs up.
    pub fn spawn(extended: bool, scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || serve(listener, extended, scripts));
        Self { addr, handle }
    }

    pub fn join(self) {
        self.handle.join().unwrap();
    }
}

fn header_size(extended: bool) -> usize {
    if extended {
        16
    } else {
        10
    }
}

fn serve(listener: TcpListener, extended: bool, scripts: Vec<Script>) {
    let (mut stream, _) = listener.accept().unwrap();

    // Register exchange: echo the request id, assign an instance id.
    let (opcode, request_id, _) = match read_request(&mut stream, extended) {
        Some(request) => request,
        None => return,
    };
    assert_eq!(opcode, 0x00, "first request must be Register");
    write_response(&mut stream, extended, 0x02, opcode, request_id, &[]);

    for script in scripts {
        let (opcode, request_id, payload) = match read_request(&mut stream, extended) {
            Some(request) => request,
            None => return,
        };

        // Every request shape starts with the key size; the key offset
        // depends on the opcode (SET = 0x02, UPDATE = 0x03).
        let key_at = match opcode {
            0x02 => 4,
            0x03 => 7,
            _ => 1,
        };
        let key_size = payload[0] as usize;
        let key = payload[key_at..key_at + key_size].to_vec();

        match script {
            Script::KeyOk => {
                write_response(&mut stream, extended, 0x02, opcode, request_id, &key_body(&key));
            }
            Script::Value(value) => {
                let mut body = vec![key.len() as u8];
                body.push((value.len() >> 16) as u8);
                body.push((value.len() >> 8) as u8);
                body.push(value.len() as u8);
                body.extend_from_slice(&key);
                body.extend_from_slice(&value);
                write_response(&mut stream, extended, 0x02, opcode, request_id, &body);
            }
            Script::UpdateOk => {
                // Echo the 7-byte prefix and key, omitting the update bytes.
                let body = payload[..7 + key_size].to_vec();
                write_response(&mut stream, extended, 0x02, opcode, request_id, &body);
            }
            Script::Fail => {
                write_response(&mut stream, extended, 0x03, opcode, request_id, &key_body(&key));
            }
            Script::SkewId(delta) => {
                write_response(
                    &mut stream,
                    extended,
                    0x02,
                    opcode,
                    request_id.wrapping_add(delta),
                    &key_body(&key),
                );
            }
            Script::WrongKey => {
                write_response(
                    &mut stream,
                    extended,
                    0x02,
                    opcode,
                    request_id,
                    &key_body(b"somebody-else"),
                );
            }
            Script::Hangup => return,
        }
    }

    // Drain until the client disconnects.
    let mut sink = [0u8; 1024];
    while let Ok(n) = stream.read(&mut sink) {
        if n == 0 {
            break;
        }
    }
}

fn key_body(key: &[u8]) -> Vec<u8> {
    let mut body = vec![key.len() as u8];
    body.extend_from_slice(key);
    body
}

fn read_request(stream: &mut TcpStream, extended: bool) -> Option<(u8, u32, Vec<u8>)> {
    let mut header = vec![0u8; header_size(extended)];
    stream.read_exact(&mut header).ok()?;

    let opcode = header[1];
    let payload_len =
        u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;
    let request_id = if extended {
        u32::from_be_bytes([header[8], header[9], header[10], header[11]])
    } else {
        u32::from_be_bytes([header[6], header[7], header[8], header[9]])
    };

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        stream.read_exact(&mut payload).ok()?;
    }
    Some((opcode, request_id, payload))
}

fn write_response(
    stream: &mut TcpStream,
    extended: bool,
    class: u8,
    opcode: u8,
    request_id: u32,
    body: &[u8],
) {
    // From the master/client role (0x10), to the application (0x00).
    let mut frame = Vec::with_capacity(header_size(extended) + body.len());
    frame.push(class | 0x10);
    frame.push(opcode);
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    if extended {
        frame.extend_from_slice(&MOCK_INSTANCE_ID.to_be_bytes());
        frame.extend_from_slice(&request_id.to_be_bytes());
        frame.extend_from_slice(&0u32.to_be_bytes());
    } else {
        frame.extend_from_slice(&request_id.to_be_bytes());
    }
    frame.extend_from_slice(body);
    stream.write_all(&frame).unwrap();
}
