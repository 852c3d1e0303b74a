//! Shared handle over the resource cache and the in-flight registry.
//!
//! Both structures sit behind a single synchronous lock. Checking the cache,
//! checking the registry and registering a new fetch happen under one guard,
//! so two callers can never both decide to start a fetch for the same
//! identifier. The guard must never be held across an `.await`.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use super::in_flight::{Completion, InFlightRegistry, Signal, signal};
use super::resource::ResourceCache;
use crate::error::FetchError;

/// State guarded by [`Store`].
#[derive(Debug, Default)]
pub struct StoreState {
    pub resources: ResourceCache,
    pub in_flight: InFlightRegistry,
    generation: u64,
}

impl StoreState {
    /// Incremented by every wipe. Fetches remember the generation they
    /// started in so they can tell whether their registry entry still exists.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clears resources and in-flight entries together.
    pub fn clear(&mut self) {
        self.resources.clear();
        self.in_flight.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Records the end of a fetch for `id` that started in `generation`.
    ///
    /// On success `value` is written into the resource cache. The in-flight
    /// entry is removed in both cases. If the store was wiped since the fetch
    /// started, nothing is touched and `false` is returned.
    pub fn settle(&mut self, id: &str, generation: u64, value: Option<Value>) -> bool {
        if generation != self.generation {
            return false;
        }
        if let Some(value) = value {
            self.resources.set(id, value);
        }
        self.in_flight.remove(id);
        true
    }
}

/// Result of [`Store::begin`].
pub enum Lookup {
    /// The value is cached.
    Cached(Value),
    /// A fetch is already running; await its signal.
    Joined(Signal),
    /// No fetch was running, so one was registered. The caller now owns it.
    Started(FetchTicket),
}

/// Ownership of one registered in-flight fetch.
///
/// Exactly one of two things ends it: [`FetchTicket::settle`], or the ticket
/// being dropped. Dropping removes the registry entry and then resolves the
/// signal with [`FetchErrorCause::Interrupted`](crate::FetchErrorCause::Interrupted),
/// whether the fetch panicked, was cancelled, or never got polled.
pub struct FetchTicket {
    store: Store,
    identifier: String,
    generation: u64,
    signal: Signal,
    completion: Option<Completion>,
}

impl FetchTicket {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// A handle on the signal awaiters of this fetch receive.
    pub fn signal(&self) -> Signal {
        self.signal.clone()
    }

    /// Records the outcome in the store, then wakes every awaiter.
    ///
    /// Returns `false` if the store was wiped since the fetch started, in
    /// which case the outcome is not written.
    pub fn settle(mut self, outcome: Result<Value, FetchError>) -> bool {
        let (value, settled) = match outcome {
            Ok(value) => (Some(value), Ok(())),
            Err(e) => (None, Err(e)),
        };

        let stored = self.store.inner.lock().settle(&self.identifier, self.generation, value);
        if let Some(completion) = self.completion.take() {
            completion.settle(settled);
        }
        stored
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        if self.completion.is_some() {
            tracing::warn!(identifier = %self.identifier, "fetch ended without settling");
            self.store.inner.lock().settle(&self.identifier, self.generation, None);
        }
    }
}

impl fmt::Debug for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTicket")
            .field("identifier", &self.identifier)
            .field("generation", &self.generation)
            .field("settled", &self.completion.is_none())
            .finish()
    }
}

/// Cloneable, process-wide store. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct Store {
    inner: Arc<Mutex<StoreState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state for a synchronous critical section.
    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock()
    }

    /// Looks `id` up and, if it is neither cached nor in flight, registers a
    /// new in-flight entry for it. All of this happens under one guard.
    pub fn begin(&self, id: &str) -> Lookup {
        let mut state = self.inner.lock();

        if let Some(value) = state.resources.get(id) {
            return Lookup::Cached(value);
        }

        if let Some(signal) = state.in_flight.join(id) {
            return Lookup::Joined(signal);
        }

        let (completion, signal) = signal(id);
        state.in_flight.start(id, signal.clone());
        let generation = state.generation;
        drop(state);

        Lookup::Started(FetchTicket {
            store: self.clone(),
            identifier: id.to_owned(),
            generation,
            signal,
            completion: Some(completion),
        })
    }

    /// Returns the cached value for `id` without touching the registry.
    pub fn cached(&self, id: &str) -> Option<Value> {
        self.inner.lock().resources.get(id)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.inner.lock().resources.has(id)
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.inner.lock().in_flight.has(id)
    }

    /// Number of cached resources.
    pub fn len(&self) -> usize {
        self.inner.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().resources.is_empty()
    }

    /// Drops every cached resource and every in-flight entry.
    ///
    /// Meant for isolating scenarios, not for eviction.
    pub fn wipe(&self) {
        self.inner.lock().clear();
        tracing::info!("cache wiped");
    }
}
