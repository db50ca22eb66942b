//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use crate::gemini::{GeminiResponse, GeminiTransport, TransportError};

#[derive(Clone)]
enum Reply {
    Respond { status: u8, meta: String, body: Vec<u8> },
    BrokenBody { status: u8, meta: String },
    Refuse,
}

/// Replies to known targets; unknown targets are refused.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, target: &str, status: u8, meta: &str, body: &[u8]) -> Self {
        self.insert(target, Reply::Respond {
            status,
            meta: meta.to_string(),
            body: body.to_vec(),
        })
    }

    pub fn broken_body(self, target: &str, status: u8, meta: &str) -> Self {
        self.insert(target, Reply::BrokenBody {
            status,
            meta: meta.to_string(),
        })
    }

    pub fn refuse(self, target: &str) -> Self {
        self.insert(target, Reply::Refuse)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn insert(self, target: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(target.to_string(), reply);
        self
    }
}

#[async_trait]
impl GeminiTransport for ScriptedTransport {
    async fn fetch(&self, target: &str) -> Result<GeminiResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().get(target).cloned();
        match reply {
            Some(Reply::Respond { status, meta, body }) => {
                Ok(GeminiResponse::new(status, meta).with_body(io::Cursor::new(body)))
            }
            Some(Reply::BrokenBody { status, meta }) => {
                Ok(GeminiResponse::new(status, meta).with_body(BrokenReader))
            }
            Some(Reply::Refuse) | None => Err(TransportError::Connect {
                addr: target.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            }),
        }
    }
}

/// A body that fails on the first read.
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")))
    }
}
