#![forbid(unsafe_code)]
//! mqr-io: CSV dataset readers and snapshot writers.

pub mod error;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::CsvReader;
pub use writers::json::SnapshotWriter;
