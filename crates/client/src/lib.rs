//! Client code for prefill.
//!
//! This crate provides the network transport, the single-flight fetch
//! coordinator used by both the producer and consumer contexts, and the
//! observable data hook used by rendering code.

pub mod coordinator;
pub mod hook;
pub mod transport;

pub use coordinator::FetchCoordinator;
pub use hook::{DataHook, FetchState};
pub use transport::{HttpTransport, Response, Transport, TransportConfig, TransportError};

#[cfg(any(test, feature = "test-util"))]
pub use transport::MemoryTransport;
