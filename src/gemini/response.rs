//! Response header parsing and body consumption.

use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::gemini::error::{ReadError, TransportError};
use crate::gemini::status::StatusClass;

/// Longest meta string the protocol allows.
pub const MAX_META_LEN: usize = 1024;

/// The unread remainder of a response.
pub type BodyStream = Box<dyn AsyncRead + Send + Unpin>;

/// A response header plus its body stream.
pub struct GeminiResponse {
    pub status: u8,
    pub meta: String,
    body: Option<BodyStream>,
}

impl GeminiResponse {
    /// Create a response without a body.
    pub fn new(status: u8, meta: impl Into<String>) -> Self {
        Self {
            status,
            meta: meta.into(),
            body: None,
        }
    }

    /// Attach a body stream.
    pub fn with_body(mut self, body: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::from_code(self.status)
    }

    /// Read the whole body, bounded by `max_bytes` and `timeout`.
    ///
    /// Consumes the response so the stream can only be drained once.
    pub async fn read_body(self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, ReadError> {
        let Some(body) = self.body else {
            return Ok(Vec::new());
        };

        let mut limited = body.take(max_bytes as u64 + 1);
        let mut buf = Vec::new();
        match tokio::time::timeout(timeout, limited.read_to_end(&mut buf)).await {
            Err(_) => Err(ReadError::Timeout(timeout.as_secs())),
            // Many servers close the socket without a TLS close_notify.
            Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => check_len(buf, max_bytes),
            Ok(Err(e)) => Err(ReadError::Io(e)),
            Ok(Ok(_)) => check_len(buf, max_bytes),
        }
    }
}

fn check_len(buf: Vec<u8>, max_bytes: usize) -> Result<Vec<u8>, ReadError> {
    if buf.len() > max_bytes {
        Err(ReadError::TooLarge(max_bytes))
    } else {
        Ok(buf)
    }
}

impl fmt::Debug for GeminiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiResponse")
            .field("status", &self.status)
            .field("meta", &self.meta)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Parse a `<STATUS><SPACE><META>` header line (line terminator optional).
pub fn parse_header(line: &str) -> Result<(u8, String), TransportError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let code = line
        .get(..2)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u8>().ok())
        .ok_or_else(|| TransportError::MalformedHeader(format!("bad status in {:?}", line)))?;

    let rest = &line[2..];
    let meta = match rest.strip_prefix([' ', '\t']) {
        Some(meta) => meta,
        None if rest.is_empty() => "",
        None => {
            return Err(TransportError::MalformedHeader(format!(
                "missing separator in {:?}",
                line
            )))
        }
    };

    if meta.len() > MAX_META_LEN {
        return Err(TransportError::MalformedHeader(format!(
            "meta longer than {} bytes",
            MAX_META_LEN
        )));
    }

    Ok((code, meta.to_string()))
}
