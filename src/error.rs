//! Error taxonomy for the ring, wire codec, and RPC transport layers.
//!
//! Mirrors the hand-rolled `Display` + `std::error::Error` style used
//! throughout the rest of this codebase rather than pulling in a derive
//! macro crate: each layer gets one small enum naming the ways it fails.

use std::fmt;

/// Errors surfaced by the framed TCP transport (§6 wire encoding).
#[derive(Debug)]
pub enum TransportError {
    /// The underlying socket returned an I/O error.
    Io(std::io::Error),
    /// A length-prefixed frame could not be decoded as a valid envelope.
    Codec(bincode::Error),
    /// The peer closed the connection before a full frame arrived.
    ConnectionClosed,
    /// A call did not complete within its deadline.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "transport I/O error: {e}"),
            TransportError::Codec(e) => write!(f, "malformed wire frame: {e}"),
            TransportError::ConnectionClosed => write!(f, "connection closed by peer"),
            TransportError::Timeout => write!(f, "RPC call exceeded its deadline"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<bincode::Error> for TransportError {
    fn from(e: bincode::Error) -> Self {
        TransportError::Codec(e)
    }
}

/// Errors reported by CLI launchers, printed to stderr before a non-zero exit.
#[derive(Debug)]
pub enum CliError {
    /// Could not reach the peer at all (dial failure or RPC-level failure).
    Connect(String),
    /// The peer answered but rejected the request (`Ack { success: false }`).
    Rejected(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Connect(msg) => write!(f, "{msg}"),
            CliError::Rejected(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}
