//! Core types and shared state for prefill.
//!
//! This crate provides:
//! - The process-wide resource cache and in-flight registry
//! - The transfer string format used to move a cache between contexts
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod transfer;

pub use cache::{Completion, FetchTicket, InFlightRegistry, Lookup, ResourceCache, Settled, Signal, Store, StoreState};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, FetchError, FetchErrorCause, PreloadError, TransferParseError};
