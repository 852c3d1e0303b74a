//! Process-wide cache of fetched resources and in-flight fetches.
//!
//! This module provides the shared state every fetch goes through:
//!
//! - [`ResourceCache`]: identifier → decoded JSON value, never expires
//! - [`InFlightRegistry`]: identifier → completion signal of the running fetch
//! - [`Store`]: the cloneable handle that owns both behind one lock
//!
//! Identifiers are used verbatim. Two strings that name the same resource
//! with different escaping, case or trailing slash are different keys.

pub mod in_flight;
pub mod resource;
pub mod store;

pub use in_flight::{Completion, InFlightRegistry, Settled, Signal, signal};
pub use resource::ResourceCache;
pub use store::{FetchTicket, Lookup, Store, StoreState};
