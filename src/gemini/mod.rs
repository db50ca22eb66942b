//! Gemini protocol client subsystem.
//!
//! # Data Flow
//! ```text
//! target URL (gemini://host[:port]/path?query)
//!     → client.rs (TCP connect with timeout, TLS handshake, request line)
//!     → response.rs (header line parsed, body stream handed back)
//!     → status.rs (two-digit code classified into a StatusClass)
//! ```
//!
//! # Design Decisions
//! - The gateway core only sees the `GeminiTransport` trait, so tests can
//!   script responses without touching the network
//! - Certificates are not verified; trust management is out of scope
//! - The body is a one-shot stream, consumed by value

pub mod client;
pub mod error;
pub mod response;
pub mod status;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use error::{ReadError, TransportError};
pub use response::GeminiResponse;
pub use status::{FailureKind, StatusClass};

#[cfg(test)]
pub(crate) mod testing;

/// Default port for the Gemini protocol.
pub const DEFAULT_PORT: u16 = 1965;

/// Anything that can issue a single Gemini request.
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    /// Fetch `target` (an absolute `gemini://` URL) and return the response header
    /// with its unread body.
    async fn fetch(&self, target: &str) -> Result<GeminiResponse, TransportError>;
}
