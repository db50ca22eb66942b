//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS termination for the web side)
//!     → Hand off to HTTP layer
//! ```
//!
//! Outbound gemini connections live in the `gemini` module.

pub mod tls;

pub use tls::load_tls_config;
