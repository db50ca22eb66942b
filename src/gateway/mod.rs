//! Gemini to web translation core.
//!
//! # Data Flow
//! ```text
//! GatewayRequest (host/path?query)
//!     → dispatch.rs (fetch via transport, branch on status class)
//!         → render.rs (gemtext → HTML fragment)
//!             → url.rs (link targets → /gateway/ paths)
//!         → theme.rs (per-host accent color, cached)
//!     → Outcome: page model, raw bytes or redirect
//! ```
//!
//! # Design Decisions
//! - No HTTP types here; the http layer maps an Outcome to a response
//! - Transport and theme cache are injected, never global

pub mod dispatch;
pub mod render;
pub mod theme;
pub mod url;

pub use dispatch::{Dispatcher, GatewayRequest, Outcome, PageKind, PageStatus, RenderedPage};
pub use theme::ThemeResolver;
pub use url::{to_proxy_path, GATEWAY_PREFIX};
