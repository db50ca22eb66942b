//! Gemini client over TCP + TLS.
//!
//! # Responsibilities
//! - Resolve the target URL into host, port and request line
//! - Enforce the connect timeout
//! - Perform the TLS handshake with SNI
//! - Parse the header line and return the body stream
//!
//! # Design Decisions
//! - Any server certificate is accepted (self-signed certificates are the norm)
//! - One connection per request, no pooling

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::Url;

use crate::gemini::error::TransportError;
use crate::gemini::response::{parse_header, GeminiResponse, MAX_META_LEN};
use crate::gemini::{GeminiTransport, DEFAULT_PORT};

/// Header line limit: two status digits, a space, meta and CRLF.
const MAX_HEADER_LEN: u64 = (MAX_META_LEN + 5) as u64;

/// Client for the Gemini protocol.
#[derive(Clone)]
pub struct GeminiClient {
    connector: TlsConnector,
    connect_timeout: Duration,
}

impl GeminiClient {
    /// Build a client with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let provider = Arc::new(crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            connect_timeout,
        })
    }
}

#[async_trait]
impl GeminiTransport for GeminiClient {
    async fn fetch(&self, target: &str) -> Result<GeminiResponse, TransportError> {
        let url = Url::parse(target).map_err(|e| TransportError::InvalidUrl {
            url: target.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "gemini" {
            return Err(TransportError::InvalidUrl {
                url: target.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TransportError::InvalidUrl {
                url: target.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_PORT);
        let addr = format!("{}:{}", host, port);

        tracing::debug!(target_url = %url, addr = %addr, "Connecting to gemini host");

        let tcp = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransportError::Connect { addr, source }),
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr,
                    secs: self.connect_timeout.as_secs(),
                })
            }
        };

        // IPv6 literals come back bracketed from the url crate.
        let sni_host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let server_name =
            ServerName::try_from(sni_host).map_err(|e| TransportError::Tls(e.to_string()))?;
        let mut tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        tls.write_all(format!("{}\r\n", url).as_bytes()).await?;
        tls.flush().await?;

        let mut reader = BufReader::new(tls);
        let mut header = Vec::new();
        (&mut reader)
            .take(MAX_HEADER_LEN)
            .read_until(b'\n', &mut header)
            .await?;
        if !header.ends_with(b"\n") {
            return Err(TransportError::MalformedHeader(
                "header line missing or too long".to_string(),
            ));
        }

        let header = String::from_utf8_lossy(&header);
        let (status, meta) = parse_header(&header)?;

        tracing::debug!(target_url = %url, status, meta = %meta, "Gemini response header");

        Ok(GeminiResponse::new(status, meta).with_body(reader))
    }
}

/// Accepts every server certificate but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
