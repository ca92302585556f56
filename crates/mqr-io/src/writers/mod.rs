//! Snapshot writers.

pub mod json;
