//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gemgate::config::GatewayConfig;
use gemgate::gemini::{GeminiResponse, GeminiTransport, TransportError};
use gemgate::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// In-memory gemini space: known targets get scripted replies, the rest are refused.
#[derive(Default)]
pub struct MockGemini {
    documents: Mutex<HashMap<String, (u8, String, Vec<u8>)>>,
    requests: Mutex<Vec<String>>,
}

impl MockGemini {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, target: &str, status: u8, meta: &str, body: &[u8]) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(target.to_string(), (status, meta.to_string(), body.to_vec()));
        self
    }

    /// Every target fetched so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn count(&self, target: &str) -> usize {
        self.requests().iter().filter(|t| *t == target).count()
    }
}

#[async_trait]
impl GeminiTransport for MockGemini {
    async fn fetch(&self, target: &str) -> Result<GeminiResponse, TransportError> {
        self.requests.lock().unwrap().push(target.to_string());

        let document = self.documents.lock().unwrap().get(target).cloned();
        match document {
            Some((status, meta, body)) => {
                Ok(GeminiResponse::new(status, meta).with_body(io::Cursor::new(body)))
            }
            None => Err(TransportError::Connect {
                addr: target.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            }),
        }
    }
}

/// A running gateway; shuts down when dropped.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Gateway unreachable")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port backed by `gemini`.
pub async fn start_gateway(gemini: Arc<MockGemini>) -> TestGateway {
    start_gateway_with(GatewayConfig::default(), gemini).await
}

pub async fn start_gateway_with(config: GatewayConfig, gemini: Arc<MockGemini>) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::with_transport(config, gemini);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestGateway {
        addr,
        client,
        shutdown,
    }
}
