//! Error types for the HTTP client.
//!
//! # Design
//! One variant per failure kind a caller can act on. Transport failures keep
//! the underlying `io::Error` so the client can tell a dead reused connection
//! (retry on a fresh one) apart from a peer that answered with garbage
//! (`Protocol`, never retried).

use std::io;

use thiserror::Error;

/// Errors returned by every client, codec and connection operation.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The URL could not be split into scheme, host and path.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// The URL scheme is neither `http` nor `https`.
    #[error("unsupported scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    /// TCP connect failed, or the connection broke while sending or receiving.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The TLS session could not be established.
    #[error("TLS handshake with {host} failed: {reason}")]
    TlsHandshake { host: String, reason: String },

    /// The peer sent a malformed status line or header block.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The response body is not valid UTF-8 or not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A configuration value read from the environment is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HttpError {
    /// True for transport failures, the only kind worth retrying on a fresh
    /// connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, HttpError::Connection(_))
    }

    pub(crate) fn closed(context: &str) -> Self {
        HttpError::Connection(io::Error::new(io::ErrorKind::UnexpectedEof, context.to_string()))
    }
}
