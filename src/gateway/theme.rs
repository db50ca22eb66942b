//! Per-host theme lookup.
//!
//! # Responsibilities
//! - Serve cached accent colors per host
//! - Fetch `gemini://<host>/theme` on first access
//! - Fall back to the default theme on any failure
//!
//! # Design Decisions
//! - DashMap shards its locks, so a write for one host does not stall reads for others
//! - Concurrent misses for the same host may fetch twice; the last insert wins
//! - Entries live for the whole process

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::config::{GatewaySettings, GeminiConfig};
use crate::gemini::{GeminiTransport, StatusClass};
use crate::observability::metrics;

/// Longest theme value accepted from a host.
const MAX_THEME_LEN: usize = 64;

/// Cached theme lookup shared by all requests.
#[derive(Clone)]
pub struct ThemeResolver {
    cache: Arc<DashMap<String, String>>,
    transport: Arc<dyn GeminiTransport>,
    enabled: bool,
    path: String,
    default_theme: String,
    read_timeout: Duration,
}

impl ThemeResolver {
    pub fn new(
        transport: Arc<dyn GeminiTransport>,
        settings: &GatewaySettings,
        gemini: &GeminiConfig,
    ) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            transport,
            enabled: settings.theme_enabled,
            path: settings.theme_path.clone(),
            default_theme: settings.default_theme.clone(),
            read_timeout: gemini.read_timeout(),
        }
    }

    /// Theme for `host`, fetching it on a cache miss.
    pub async fn get(&self, host: &str) -> String {
        if !self.enabled {
            return self.default_theme.clone();
        }

        let cached = self.cache.get(host).map(|entry| entry.value().clone());
        if let Some(theme) = cached {
            return theme;
        }

        tracing::debug!(host = %host, "Theme cache miss");
        let theme = self.fetch(host).await;
        self.cache.insert(host.to_string(), theme.clone());
        metrics::record_theme_cache_size(self.cache.len());
        theme
    }

    /// Cached theme without fetching.
    pub fn cached(&self, host: &str) -> Option<String> {
        self.cache.get(host).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    async fn fetch(&self, host: &str) -> String {
        let target = format!("gemini://{}{}", host, self.path);

        let response = match self.transport.fetch(&target).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(host = %host, error = %e, "Theme fetch failed");
                return self.default_theme.clone();
            }
        };

        if response.class() != StatusClass::Success {
            tracing::debug!(host = %host, status = response.status, "Host has no theme");
            return self.default_theme.clone();
        }

        match response.read_body(MAX_THEME_LEN * 4, self.read_timeout).await {
            Ok(body) => {
                let text = String::from_utf8_lossy(&body);
                let theme = text.trim();
                if is_plausible_color(theme) {
                    theme.to_string()
                } else {
                    tracing::debug!(host = %host, "Ignoring malformed theme");
                    self.default_theme.clone()
                }
            }
            Err(e) => {
                tracing::debug!(host = %host, error = %e, "Theme body read failed");
                self.default_theme.clone()
            }
        }
    }
}

/// Accepts hex colors, names and functional notations like `rgb(1, 2, 3)`.
fn is_plausible_color(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_THEME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "#(),.%- ".contains(c))
}
