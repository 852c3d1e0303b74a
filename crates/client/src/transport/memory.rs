//! In-process transport serving canned responses.
//!
//! Counts every call it receives and can hold calls open until released,
//! which makes it possible to line up concurrent callers against one fetch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::sync::watch;

use super::{Response, Transport, TransportError};

#[derive(Debug, Clone)]
enum Canned {
    Reply { status: StatusCode, body: String },
    Fail(String),
}

/// Transport backed by an in-memory routing table.
///
/// Unknown identifiers answer `404` with an empty body.
#[derive(Debug)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, Canned>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
            gate: watch::channel(true).0,
        }
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `id` with `status` and `body`.
    pub fn respond(&self, id: impl Into<String>, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.routes.lock().insert(id.into(), Canned::Reply { status, body: body.into() });
    }

    /// Answers `id` with a `200` and `body`.
    pub fn respond_json(&self, id: impl Into<String>, body: impl Into<String>) {
        self.respond(id, 200, body);
    }

    /// Makes calls for `id` fail before any response is produced.
    pub fn fail(&self, id: impl Into<String>, message: impl Into<String>) {
        self.routes.lock().insert(id.into(), Canned::Fail(message.into()));
    }

    /// Holds every subsequent call open until [`MemoryTransport::release`].
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Lets held and future calls complete.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Total calls received.
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Calls received for `id`.
    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().get(id).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn fetch(&self, id: &str) -> Result<Response, TransportError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(id.to_owned()).or_default() += 1;

        let mut gate = self.gate.subscribe();
        // The sender lives as long as `self`, so this only ends once released.
        let _ = gate.wait_for(|open| *open).await;

        let canned = self.routes.lock().get(id).cloned();
        match canned {
            Some(Canned::Reply { status, body }) => Ok(Response::new(status, body)),
            Some(Canned::Fail(message)) => Err(TransportError::Network(message)),
            None => Ok(Response::new(StatusCode::NOT_FOUND, "")),
        }
    }
}
