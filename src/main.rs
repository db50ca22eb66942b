//! gemgate: a Gemini to HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                                                            Gemini host
//!      │   GET /gateway/host/path                                          ▲
//!      ▼                                                                   │
//!  ┌────────┐   ┌────────────┐   ┌───────────┐   ┌──────────────┐          │
//!  │  http  │──▶│  gateway   │──▶│  gemini   │──▶│ TCP + TLS    │──────────┘
//!  │ server │   │ dispatcher │   │  client   │   │ request line │
//!  └────────┘   └─────┬──────┘   └───────────┘   └──────────────┘
//!      ▲              │
//!      │        ┌─────┴─────────────────────┐
//!      │        │ render (gemtext → HTML)   │
//!      │        │ url (links → /gateway/)   │
//!      │        │ theme (per-host, cached)  │
//!      │        └─────┬─────────────────────┘
//!      │              ▼
//!      └──── page / raw bytes / redirect
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gemgate::config::{load_config, validation::validate_config, ConfigError, GatewayConfig};
use gemgate::lifecycle::{shutdown_signal, Shutdown};
use gemgate::net::load_tls_config;
use gemgate::observability::{logging, metrics};
use gemgate::HttpServer;

#[derive(Parser)]
#[command(name = "gemgate")]
#[command(about = "Browse Gemini space from a web browser", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("gemgate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        connect_timeout_secs = config.gemini.connect_timeout_secs,
        read_timeout_secs = config.gemini.read_timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config.clone())?;

    match &config.listener.tls {
        Some(tls) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let rustls = load_tls_config(tls).await?;
            server.run_tls(addr, rustls, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
