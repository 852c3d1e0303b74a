//! Registry of fetches that have started but not yet settled.
//!
//! Each entry is a [`Signal`]: a shared future that resolves once, with no
//! payload beyond success or the [`FetchError`] of the fetch. Any number of
//! callers may clone and await it; all of them observe the same outcome.

use std::collections::HashMap;
use std::fmt;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};

use crate::error::{FetchError, FetchErrorCause};

/// Outcome carried by a [`Signal`].
pub type Settled = Result<(), FetchError>;

/// Shared completion signal of one in-flight fetch.
pub type Signal = Shared<BoxFuture<'static, Settled>>;

/// Sending half of a [`Signal`], held by whoever performs the fetch.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<Settled>,
}

impl Completion {
    /// Settles the signal. Every current and future awaiter sees `outcome`.
    pub fn settle(self, outcome: Settled) {
        // Nobody listening is fine: the fetch still ran to completion.
        self.sender.send(outcome).ok();
    }
}

/// Creates a fresh signal for `identifier` together with its sending half.
///
/// If the [`Completion`] is dropped without settling, awaiters receive
/// [`FetchErrorCause::Interrupted`].
pub fn signal(identifier: &str) -> (Completion, Signal) {
    let (sender, receiver) = oneshot::channel();
    let identifier = identifier.to_owned();

    let signal = receiver
        .unwrap_or_else(move |_canceled| Err(FetchError::new(identifier, FetchErrorCause::Interrupted)))
        .boxed()
        .shared();

    (Completion { sender }, signal)
}

/// Identifier → signal of the fetch currently running for it.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: HashMap<String, Signal>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Returns a handle on the pending signal for `id`, if one is registered.
    pub fn join(&self, id: &str) -> Option<Signal> {
        self.pending.get(id).cloned()
    }

    /// Registers `signal` for `id`, replacing any previous entry.
    pub fn start(&mut self, id: impl Into<String>, signal: Signal) {
        let id = id.into();
        if self.pending.insert(id.clone(), signal).is_some() {
            tracing::warn!(identifier = %id, "replaced an in-flight fetch that was still registered");
        }
    }

    /// Removes the entry for `id` unconditionally.
    pub fn remove(&mut self, id: &str) {
        self.pending.remove(id);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}
