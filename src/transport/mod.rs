//! Transport module - the connection resource and its release guard.
//!
//! The dispatch core never owns a socket; it owns a
//! [`TransportResource`] that must be released exactly once per
//! request. [`ResourceGuard`] makes that exactness structural: release
//! is idempotent by construction, and a guard dropped without being
//! released performs a last-resort release itself.

mod resource;

pub use resource::{ResourceGuard, StreamResource, TransportResource};
