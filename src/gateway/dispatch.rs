//! Response dispatch: one handler per status class.
//!
//! # State Transitions
//! ```text
//! fetch failed        → Error page (status "--")
//! 1x input            → Input page, prompt = meta, body unread
//! 2x success          → read body → text/gemini: Document page
//!                                 → text/plain:  PlainText page
//!                                 → other:       raw bytes + Content-Type
//!                       read failed → Error page (status "--")
//! 3x redirect         → translated target, 31 permanent
//! 4x/5x/6x and others → Error page with status and meta
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::GeminiConfig;
use crate::gateway::render::render;
use crate::gateway::theme::ThemeResolver;
use crate::gateway::url::{host_of, to_proxy_path};
use crate::gemini::{GeminiResponse, GeminiTransport, StatusClass, TransportError};
use crate::observability::metrics;

/// A request for a document in gateway space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    path: String,
    query: Option<String>,
}

impl GatewayRequest {
    /// `path` is everything after `/gateway/`, `query` the raw query string.
    pub fn new(path: impl Into<String>, query: Option<&str>) -> Self {
        Self {
            path: path.into(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    /// Path without the query, e.g. `example.org/dir/page.gmi`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn host(&self) -> &str {
        host_of(&self.path)
    }

    /// Path with `?query` appended when present.
    pub fn path_with_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// The gemini URL this request maps to.
    pub fn target(&self) -> String {
        format!("gemini://{}", self.path_with_query())
    }
}

/// Status shown on a page: the gemini code, or a placeholder when none arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Code(u8),
    Unavailable,
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStatus::Code(code) => write!(f, "{}", code),
            PageStatus::Unavailable => f.write_str("--"),
        }
    }
}

/// Content-specific part of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Input { prompt: String, sensitive: bool },
    Document(String),
    PlainText(String),
    Error(String),
}

/// Everything the page wrapper needs to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub host: String,
    pub path: String,
    pub theme: String,
    pub status: PageStatus,
    pub kind: PageKind,
}

/// What to send back to the web client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Page(RenderedPage),
    Raw { content_type: String, body: Vec<u8> },
    Redirect { location: String, permanent: bool },
}

/// Turns gemini responses into web responses.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn GeminiTransport>,
    themes: ThemeResolver,
    max_body_bytes: usize,
    read_timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn GeminiTransport>, themes: ThemeResolver, gemini: &GeminiConfig) -> Self {
        Self {
            transport,
            themes,
            max_body_bytes: gemini.max_body_bytes,
            read_timeout: gemini.read_timeout(),
        }
    }

    /// Fetch the request's target and dispatch on the result.
    pub async fn handle(&self, request: &GatewayRequest) -> Outcome {
        let target = request.target();
        let start = Instant::now();
        let fetched = self.transport.fetch(&target).await;

        match &fetched {
            Ok(response) => {
                tracing::info!(
                    target_url = %target,
                    status = response.status,
                    meta = %response.meta,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Gemini response"
                );
                metrics::record_fetch(response.class().label(), start);
            }
            Err(e) => {
                tracing::warn!(target_url = %target, error = %e, "Gemini fetch failed");
                metrics::record_fetch("transport_error", start);
            }
        }

        self.dispatch(request, fetched).await
    }

    /// Decide the outcome for an already fetched response.
    pub async fn dispatch(
        &self,
        request: &GatewayRequest,
        fetched: Result<GeminiResponse, TransportError>,
    ) -> Outcome {
        let response = match fetched {
            Ok(response) => response,
            Err(e) => {
                return self
                    .page(request, PageStatus::Unavailable, PageKind::Error(e.to_string()))
                    .await
            }
        };

        match response.class() {
            StatusClass::InputRequired { sensitive } => {
                let status = PageStatus::Code(response.status);
                let prompt = response.meta;
                self.page(request, status, PageKind::Input { prompt, sensitive }).await
            }
            StatusClass::Success => self.success(request, response).await,
            StatusClass::Redirect { permanent } => Outcome::Redirect {
                location: to_proxy_path(&response.meta, request.path()),
                permanent,
            },
            StatusClass::Error(kind) => {
                let description = if response.meta.is_empty() {
                    kind.to_string()
                } else {
                    response.meta
                };
                self.page(request, PageStatus::Code(response.status), PageKind::Error(description))
                    .await
            }
        }
    }

    async fn success(&self, request: &GatewayRequest, response: GeminiResponse) -> Outcome {
        let status = PageStatus::Code(response.status);
        let meta = response.meta.clone();

        let body = match response.read_body(self.max_body_bytes, self.read_timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path = %request.path(), error = %e, "Gemini body read failed");
                return self
                    .page(request, PageStatus::Unavailable, PageKind::Error(e.to_string()))
                    .await;
            }
        };

        match media_type(&meta).as_str() {
            "text/gemini" => {
                let text = String::from_utf8_lossy(&body);
                let fragment = render(&text, request.path());
                self.page(request, status, PageKind::Document(fragment)).await
            }
            "text/plain" => {
                let text = String::from_utf8_lossy(&body).into_owned();
                self.page(request, status, PageKind::PlainText(text)).await
            }
            _ => Outcome::Raw {
                content_type: meta,
                body,
            },
        }
    }

    async fn page(&self, request: &GatewayRequest, status: PageStatus, kind: PageKind) -> Outcome {
        let host = request.host();
        Outcome::Page(RenderedPage {
            host: host.to_string(),
            path: request.path_with_query(),
            theme: self.themes.get(host).await,
            status,
            kind,
        })
    }
}

/// Media type of a success meta, lowercased; an empty meta means gemtext.
pub fn media_type(meta: &str) -> String {
    let essence = meta.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        "text/gemini".to_string()
    } else {
        essence.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewaySettings;
    use crate::gemini::testing::ScriptedTransport;

    fn dispatcher(transport: ScriptedTransport) -> Dispatcher {
        let transport: Arc<dyn GeminiTransport> = Arc::new(transport);
        let gemini = GeminiConfig::default();
        let themes = ThemeResolver::new(transport.clone(), &GatewaySettings::default(), &gemini);
        Dispatcher::new(transport, themes, &gemini)
    }

    fn expect_page(outcome: Outcome) -> RenderedPage {
        match outcome {
            Outcome::Page(page) => page,
            other => panic!("expected a page, got {:?}", other),
        }
    }

    #[test]
    fn test_request_parts() {
        let request = GatewayRequest::new("example.org:1966/a/b.gmi", Some("x%20y"));
        assert_eq!(request.host(), "example.org:1966");
        assert_eq!(request.path(), "example.org:1966/a/b.gmi");
        assert_eq!(request.path_with_query(), "example.org:1966/a/b.gmi?x%20y");
        assert_eq!(request.target(), "gemini://example.org:1966/a/b.gmi?x%20y");

        let request = GatewayRequest::new("example.org/", Some(""));
        assert_eq!(request.target(), "gemini://example.org/");
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("text/plain;charset=utf-8"), "text/plain");
        assert_eq!(media_type("Text/Gemini ; lang=en"), "text/gemini");
        assert_eq!(media_type(""), "text/gemini");
        assert_eq!(media_type("image/png"), "image/png");
    }

    #[tokio::test]
    async fn test_transport_error_page() {
        let gateway = dispatcher(ScriptedTransport::new());
        let request = GatewayRequest::new("down.org/page", None);

        let page = expect_page(gateway.handle(&request).await);
        assert_eq!(page.host, "down.org");
        assert_eq!(page.status, PageStatus::Unavailable);
        assert_eq!(page.status.to_string(), "--");
        assert_eq!(page.theme, "#000");
        assert!(matches!(page.kind, PageKind::Error(ref e) if e.contains("refused")));
    }

    #[tokio::test]
    async fn test_input_page() {
        let gateway = dispatcher(ScriptedTransport::new().respond(
            "gemini://example.org/search",
            10,
            "Search query",
            b"",
        ));
        let page = expect_page(gateway.handle(&GatewayRequest::new("example.org/search", None)).await);
        assert_eq!(page.status, PageStatus::Code(10));
        assert_eq!(
            page.kind,
            PageKind::Input {
                prompt: "Search query".to_string(),
                sensitive: false
            }
        );
    }

    #[tokio::test]
    async fn test_sensitive_input_page() {
        let gateway = dispatcher(ScriptedTransport::new().respond(
            "gemini://example.org/login",
            11,
            "Password",
            b"",
        ));
        let page = expect_page(gateway.handle(&GatewayRequest::new("example.org/login", None)).await);
        assert!(matches!(page.kind, PageKind::Input { sensitive: true, .. }));
    }

    #[tokio::test]
    async fn test_gemtext_document() {
        let gateway = dispatcher(
            ScriptedTransport::new()
                .respond(
                    "gemini://example.org/dir/index.gmi",
                    20,
                    "text/gemini; lang=en",
                    b"# Hello\n=> other.gmi Other",
                )
                .respond("gemini://example.org/theme", 20, "text/plain", b"#123456"),
        );
        let request = GatewayRequest::new("example.org/dir/index.gmi", None);

        let page = expect_page(gateway.handle(&request).await);
        assert_eq!(page.theme, "#123456");
        assert_eq!(page.path, "example.org/dir/index.gmi");
        match page.kind {
            PageKind::Document(fragment) => {
                assert!(fragment.contains("<h1>Hello</h1>"));
                assert!(fragment.contains(r#"href="/gateway/example.org/dir/other.gmi""#));
            }
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_text_not_rendered() {
        let gateway = dispatcher(ScriptedTransport::new().respond(
            "gemini://example.org/hello.txt",
            20,
            "text/plain;charset=utf-8",
            b"hello",
        ));
        let page = expect_page(gateway.handle(&GatewayRequest::new("example.org/hello.txt", None)).await);
        assert_eq!(page.kind, PageKind::PlainText("hello".to_string()));
    }

    #[tokio::test]
    async fn test_other_media_passes_through() {
        let gateway = dispatcher(ScriptedTransport::new().respond(
            "gemini://example.org/cat.png",
            20,
            "image/png",
            &[0x89, b'P', b'N', b'G'],
        ));
        let outcome = gateway.handle(&GatewayRequest::new("example.org/cat.png", None)).await;
        assert_eq!(
            outcome,
            Outcome::Raw {
                content_type: "image/png".to_string(),
                body: vec![0x89, b'P', b'N', b'G'],
            }
        );
    }

    #[tokio::test]
    async fn test_read_failure_page() {
        let gateway =
            dispatcher(ScriptedTransport::new().broken_body("gemini://example.org/x", 20, "text/gemini"));
        let page = expect_page(gateway.handle(&GatewayRequest::new("example.org/x", None)).await);
        assert_eq!(page.status, PageStatus::Unavailable);
        assert!(matches!(page.kind, PageKind::Error(_)));
    }

    #[tokio::test]
    async fn test_permanent_redirect() {
        let gateway = dispatcher(ScriptedTransport::new());
        let request = GatewayRequest::new("host/old", None);
        let outcome = gateway
            .dispatch(&request, Ok(GeminiResponse::new(31, "/newpath")))
            .await;
        assert_eq!(
            outcome,
            Outcome::Redirect {
                location: "/gateway/host/newpath".to_string(),
                permanent: true
            }
        );
    }

    #[tokio::test]
    async fn test_temporary_redirect_resolves_relative() {
        let gateway = dispatcher(ScriptedTransport::new());
        let request = GatewayRequest::new("host/dir/old", Some("q"));
        let outcome = gateway
            .dispatch(&request, Ok(GeminiResponse::new(30, "new.gmi")))
            .await;
        assert_eq!(
            outcome,
            Outcome::Redirect {
                location: "/gateway/host/dir/new.gmi".to_string(),
                permanent: false
            }
        );
    }

    #[tokio::test]
    async fn test_protocol_error_page() {
        let gateway = dispatcher(ScriptedTransport::new());
        let request = GatewayRequest::new("host/missing", None);

        let page = expect_page(
            gateway
                .dispatch(&request, Ok(GeminiResponse::new(51, "Not found")))
                .await,
        );
        assert_eq!(page.status, PageStatus::Code(51));
        assert_eq!(page.kind, PageKind::Error("Not found".to_string()));

        let page = expect_page(gateway.dispatch(&request, Ok(GeminiResponse::new(44, ""))).await);
        assert_eq!(page.kind, PageKind::Error("temporary failure".to_string()));
    }
}
