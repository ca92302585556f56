#![forbid(unsafe_code)]
//! mqr-exec: report runtime, worker scheduling, deterministic replay, and the
//! YAML report definition format.
//!
//! A [`Report`] runs its declared metrics against one fresh
//! [`mqr_metrics::Context`] per run, in declared order or spread over a bounded
//! worker pool, and assembles a [`mqr_core::snapshot::Snapshot`] whose entries
//! keep declaration order regardless of completion order.

pub mod dsl;
pub mod metrics;
pub mod replay;
pub mod report;
pub mod scheduler;

pub use dsl::{apply_report_config, parse_yaml_report, ParsedReport, ReportConfigDoc};
pub use report::{ExecError, Report};
