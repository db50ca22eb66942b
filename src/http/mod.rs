//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID, tracing span)
//!     → gateway core produces an Outcome
//!     → response.rs (page wrapper, raw passthrough, redirect)
//!     → page.rs (HTML document)
//!     → Send to client
//! ```

pub mod page;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
