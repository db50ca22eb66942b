//! Gemini to HTTP gateway library.
//!
//! Serves gemini space to web browsers: `/gateway/<host>/<path>` is fetched
//! over Gemini and answered with an HTML page, a raw passthrough or a redirect.

// Core subsystems
pub mod config;
pub mod gateway;
pub mod gemini;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
