//! Single-flight fetch coordination.
//!
//! Every request for an identifier goes through [`FetchCoordinator::resolve`]:
//!
//! 1. cached → return the value without suspending
//! 2. in flight → await the running fetch, then read the cache
//! 3. otherwise → register a new in-flight entry and start the fetch
//!
//! Steps 1-3 run under the store lock, so the registration in step 3 is
//! visible before the first suspension point. The fetch itself runs on its
//! own task and always settles, even if every caller stops waiting.

use std::sync::Arc;

use futures::future::try_join_all;
use prefill_core::{FetchError, FetchErrorCause, FetchTicket, Lookup, PreloadError, Store};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::transport::Transport;

/// Resolves identifiers against a shared [`Store`], hitting the transport at
/// most once per identifier at a time.
#[derive(Clone)]
pub struct FetchCoordinator {
    store: Store,
    transport: Arc<dyn Transport>,
}

impl FetchCoordinator {
    pub fn new(store: Store, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// The store this coordinator reads and writes.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the value for `id`, fetching it if nobody has yet.
    ///
    /// Concurrent callers for the same identifier share one network call and
    /// all receive the same value or the same [`FetchError`]. A failure is not
    /// remembered: the next call after it fetches again.
    ///
    /// Outside a tokio runtime only cached identifiers resolve; anything else
    /// fails with [`FetchErrorCause::Interrupted`].
    pub async fn resolve(&self, id: &str) -> Result<Value, FetchError> {
        let signal = match self.store.begin(id) {
            Lookup::Cached(value) => {
                tracing::trace!(identifier = id, "cache hit");
                return Ok(value);
            }
            Lookup::Joined(signal) => {
                tracing::debug!(identifier = id, "joined in-flight fetch");
                signal
            }
            Lookup::Started(ticket) => {
                let signal = ticket.signal();
                self.spawn(ticket);
                signal
            }
        };

        signal.await?;

        self.store.cached(id).ok_or_else(|| FetchError::new(id, FetchErrorCause::Wiped))
    }

    /// Resolves `id` ahead of rendering.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure wrapped with the identifier as context.
    pub async fn preload(&self, id: &str) -> Result<(), PreloadError> {
        self.resolve(id).await?;
        Ok(())
    }

    /// Preloads every identifier concurrently, failing on the first error.
    pub async fn preload_all<I, S>(&self, ids: I) -> Result<(), PreloadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<S> = ids.into_iter().collect();
        try_join_all(ids.iter().map(|id| self.preload(id.as_ref()))).await?;
        Ok(())
    }

    /// Clears the cache and every in-flight entry.
    pub fn wipe(&self) {
        self.store.wipe();
    }

    /// Runs the fetch for `ticket` on its own task.
    ///
    /// The ticket moves into the task before it is spawned, so the entry is
    /// cleared even if the task is dropped without ever being polled.
    fn spawn(&self, ticket: FetchTicket) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(identifier = ticket.identifier(), "no runtime to run the fetch on");
            let error = FetchError::new(ticket.identifier(), FetchErrorCause::Interrupted);
            ticket.settle(Err(error));
            return;
        };

        tracing::debug!(identifier = ticket.identifier(), "starting fetch");
        handle.spawn(self.clone().run(ticket));
    }

    async fn run(self, ticket: FetchTicket) {
        let outcome = self.fetch(ticket.identifier()).await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "fetch failed");
        }

        let identifier = ticket.identifier().to_owned();
        if !ticket.settle(outcome) {
            tracing::debug!(identifier = %identifier, "store wiped during fetch; result discarded");
        }
    }

    async fn fetch(&self, id: &str) -> Result<Value, FetchError> {
        let response = self
            .transport
            .fetch(id)
            .await
            .map_err(|e| FetchError::new(id, FetchErrorCause::Transport(e.to_string())))?;

        if !response.status.is_success() {
            return Err(FetchError::new(id, FetchErrorCause::Status(response.status.as_u16())));
        }

        serde_json::from_slice(&response.body).map_err(|e| FetchError::new(id, FetchErrorCause::Decode(e.to_string())))
    }
}
