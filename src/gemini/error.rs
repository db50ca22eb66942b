//! Transport and body read errors.

use thiserror::Error;

/// Failures while establishing a Gemini exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Target could not be parsed or is not a gemini URL.
    #[error("invalid target URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// TCP connection failed.
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connection did not complete in time.
    #[error("connection to {addr} timed out after {secs} seconds")]
    ConnectTimeout { addr: String, secs: u64 },

    /// TLS configuration or handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The response header line was not `<status> <meta>\r\n`.
    #[error("malformed response header: {0}")]
    MalformedHeader(String),

    /// Socket error while sending the request or reading the header.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while reading a response body.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("body read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("body read timed out after {0} seconds")]
    Timeout(u64),

    #[error("body exceeds {0} bytes")]
    TooLarge(usize),
}
