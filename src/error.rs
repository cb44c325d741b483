//! Error types for the StratoKV client
//!
//! Provides a unified error type for all operations.
//!
//! A well-formed `ResponseFailure` from the server (e.g. key not found on
//! GET) is deliberately *not* represented here: it is a normal protocol
//! outcome and surfaces as `Ok(None)` / `Ok(false)` from the client API.

use thiserror::Error;

/// Result type alias using StratoError
pub type Result<T> = std::result::Result<T, StratoError>;

/// Unified error type for StratoKV client operations
#[derive(Debug, Error)]
pub enum StratoError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Session is not connected")]
    NotConnected,

    #[error("Incomplete frame: expected {expected} bytes, got {got} before stream end")]
    IncompleteFrame { expected: usize, got: usize },

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid size: {what} is {got} bytes (max {max})")]
    InvalidSize {
        what: &'static str,
        got: usize,
        max: usize,
    },

    // -------------------------------------------------------------------------
    // Correlation Errors
    // -------------------------------------------------------------------------
    #[error("Request ID mismatch: sent {expected}, received {got}")]
    RequestIdMismatch { expected: u32, got: u32 },

    #[error("Response key does not match the request key")]
    KeyMismatch,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
