//! Security event types for the Beacon authentication core
//!
//! The authentication core emits structured security events at its boundary
//! and leaves formatting and transport to the embedding service. This crate
//! provides:
//! - The closed set of security events the core can emit
//! - An `Event` envelope for sinks that need a wire representation
//! - The `EventSink` trait plus the built-in sinks (tracing, capturing, null)
//!
//! # Example
//!
//! ```rust
//! use auth_events::{EventSink, SecurityEvent, TracingSink};
//!
//! let sink = TracingSink::default();
//! sink.emit(SecurityEvent::LockoutExpired {
//!     identity: "bob".to_string(),
//! });
//! ```

pub mod event;
pub mod sink;

pub use event::{Event, SecurityEvent};
pub use sink::{CapturingSink, EventSink, NullSink, TracingSink};
