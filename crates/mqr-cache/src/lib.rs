#![forbid(unsafe_code)]
//! mqr-cache: the per-run execution cache.
//!
//! Every expensive computation in a report run flows through
//! [`ExecutionCache::get_or_compute`], which guarantees that one key is
//! computed at most once per cache lifetime. Concurrent requesters of an
//! in-flight key block on that key only; unrelated keys never wait on each other.

pub mod cache;
pub mod error;
pub mod stats;

pub use cache::{EntryState, ExecutionCache, Resolution};
pub use error::Interrupted;
pub use stats::CacheStats;
