//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, security headers)
//! - Bind server to a plain or TLS listener
//! - Dispatch gateway requests to the gemini translation core

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::gateway::{Dispatcher, GatewayRequest, ThemeResolver, GATEWAY_PREFIX};
use crate::gemini::{GeminiClient, GeminiTransport, TransportError};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::redirect;

/// Scripts are never allowed; pages only need inline styles and same-origin forms.
const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; style-src 'unsafe-inline'; img-src 'self'; form-action 'self'";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub default_document: Arc<str>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server that talks to real gemini hosts.
    pub fn new(config: GatewayConfig) -> Result<Self, TransportError> {
        let client = GeminiClient::new(config.gemini.connect_timeout())?;
        Ok(Self::with_transport(config, Arc::new(client)))
    }

    /// Create a server on top of any transport.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn GeminiTransport>) -> Self {
        let themes = ThemeResolver::new(transport.clone(), &config.gateway, &config.gemini);
        let dispatcher = Dispatcher::new(transport, themes, &config.gemini);

        let state = AppState {
            dispatcher,
            default_document: config.gateway.default_document.as_str().into(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(root_handler))
            .route("/search", get(search_handler))
            .route("/gateway/{*path}", get(gateway_handler))
            .with_state(state);

        if config.security.enable_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// Router with all layers, for embedding or driving directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on a plain TCP listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server behind TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let grace = Duration::from_secs(self.config.timeouts.request_secs);
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// `GET /`: send visitors to the default document.
async fn root_handler(State(state): State<AppState>) -> Response {
    redirect(&format!("{}{}", GATEWAY_PREFIX, state.default_document), false)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    url: Option<String>,
    #[serde(default)]
    q: String,
}

/// `GET /search?url=<path>&q=<query>`: submit an input form.
async fn search_handler(Query(params): Query<SearchParams>) -> Response {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing url parameter").into_response();
    };

    let location = format!(
        "{}{}?{}",
        GATEWAY_PREFIX,
        url.trim_start_matches('/'),
        urlencoding::encode(&params.q)
    );
    redirect(&location, false)
}

/// `GET /gateway/<host>/<path>?<query>`: proxy one gemini document.
async fn gateway_handler(State(state): State<AppState>, uri: Uri) -> Response {
    // The raw path keeps percent-encoding intact for the gemini request.
    let path = uri.path().strip_prefix(GATEWAY_PREFIX).unwrap_or_default();
    let request = GatewayRequest::new(path, uri.query());

    tracing::debug!(target_url = %request.target(), "Gateway request");

    state.dispatcher.handle(&request).await.into_response()
}
