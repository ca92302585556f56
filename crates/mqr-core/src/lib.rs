#![forbid(unsafe_code)]
//! mqr-core: plain data shared by every layer of the report engine.
//!
//! Fingerprints, the dataset model, the uniform result model, render
//! artifacts, and the snapshot/manifest shapes live here. Nothing in this
//! crate spawns threads or touches the filesystem.

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod manifest;
pub mod prelude;
pub mod result;
pub mod snapshot;

/// Engine version recorded in every run manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
