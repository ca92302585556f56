//! Readers that load whole datasets into memory.

pub mod csv;
