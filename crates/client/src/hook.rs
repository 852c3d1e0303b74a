//! Observable fetch state for rendering code.
//!
//! A [`DataHook`] follows one identifier from loading to data or error. When
//! the identifier is already cached at bind time the hook starts out settled,
//! without spawning anything, so hydrated output renders with no network
//! activity. Otherwise it resolves through the [`FetchCoordinator`] in the
//! background and publishes the outcome.

use prefill_core::{FetchError, FetchErrorCause};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::coordinator::FetchCoordinator;

/// Snapshot of a hook's three observable fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState {
    pub loading: bool,
    pub data: Option<Value>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FetchError>,
}

fn serialize_error<S: Serializer>(error: &Option<FetchError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl FetchState {
    pub fn loading() -> Self {
        Self { loading: true, data: None, error: None }
    }

    pub fn ready(data: Value) -> Self {
        Self { loading: false, data: Some(data), error: None }
    }

    pub fn failed(error: FetchError) -> Self {
        Self { loading: false, data: None, error: Some(error) }
    }
}

/// Fetch state bound to one identifier.
#[derive(Debug)]
pub struct DataHook {
    identifier: String,
    state: watch::Receiver<FetchState>,
}

impl DataHook {
    /// Binds a hook to `id`.
    ///
    /// Outside a tokio runtime an uncached identifier settles immediately
    /// with [`FetchErrorCause::Interrupted`].
    pub fn bind(coordinator: &FetchCoordinator, id: impl Into<String>) -> Self {
        let identifier = id.into();

        if let Some(data) = coordinator.store().cached(&identifier) {
            tracing::debug!(identifier = %identifier, "hook bound to cached resource");
            let (_, state) = watch::channel(FetchState::ready(data));
            return Self { identifier, state };
        }

        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(identifier = %identifier, "hook bound outside a runtime");
            let error = FetchError::new(identifier.clone(), FetchErrorCause::Interrupted);
            let (_, state) = watch::channel(FetchState::failed(error));
            return Self { identifier, state };
        };

        let (tx, state) = watch::channel(FetchState::loading());
        let coordinator = coordinator.clone();
        let id = identifier.clone();
        handle.spawn(async move {
            let next = match coordinator.resolve(&id).await {
                Ok(data) => FetchState::ready(data),
                Err(e) => FetchState::failed(e),
            };
            tracing::debug!(identifier = %id, loading = next.loading, failed = next.error.is_some(), "hook settled");
            tx.send_replace(next);
        });

        Self { identifier, state }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Current state, read synchronously.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Waits for the next state change. Returns `false` once no further
    /// changes can happen.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Waits until the hook is no longer loading and returns that state.
    pub async fn settled(&mut self) -> FetchState {
        match self.state.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => FetchState::failed(FetchError::new(self.identifier.clone(), FetchErrorCause::Interrupted)),
        }
    }
}
