//! Session Module - streak-aware aggregation
//!
//! - `types.rs`: `SessionId`, `SessionSnapshot`, `SessionRecord`, `SessionError`
//! - `tracker.rs`: `SessionTracker` state machine
//! - `registry.rs`: `SessionRegistry` directory of trackers

pub mod types;
pub mod tracker;
pub mod registry;

pub use types::{SessionError, SessionId, SessionRecord, SessionSnapshot, SessionState};
pub use tracker::SessionTracker;
pub use registry::{SessionHandle, SessionRegistry, StreamClaim};
