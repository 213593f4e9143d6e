//! Session store and failed-attempt tracking for the Beacon auth core
//!
//! Two bounded in-memory tables with the same pluggable backing seam:
//! - The session store owns every live session record. Expiry is lazy on
//!   read, with a periodic sweep as a safety net.
//! - The failed-attempt tracker counts credential failures per identity and
//!   enforces temporary lockouts.
//!
//! Both tables apply their mutations under a single store-level lock so a
//! reclaim sweep can never race an in-flight validation. The backing store
//! (`RecordBacking`) defaults to an in-memory map; a remote cache can be
//! swapped in for multi-instance deployment.

pub mod backing;
pub mod error;
pub mod models;
pub mod store;
pub mod throttle;

pub use backing::{InMemoryBacking, RecordBacking};
pub use error::StoreError;
pub use models::{Session, SessionRequest, SessionStatus, SessionType};
pub use store::SessionStore;
pub use throttle::{FailedAttemptRecord, FailedAttemptTracker};
