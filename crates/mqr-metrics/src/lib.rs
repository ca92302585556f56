#![forbid(unsafe_code)]
//! mqr-metrics: user-facing metric kinds and the bridges that run them.
//!
//! A [`Metric`] is pure configuration. Its paired [`Calculation`] maps that
//! configuration onto a [`ComputationUnit`], requests execution through the
//! run's [`Context`] (and therefore its single-flight cache), and adapts the
//! raw unit output into the uniform `MetricResult` shape for the metric kind.
//!
//! Several metric kinds may bridge to the same unit; when their parameters
//! canonicalize to the same fingerprint they share one execution and one set
//! of render artifacts.

pub mod calculation;
pub mod context;
pub mod error;
pub mod metric;
pub mod regression;
pub mod unit;
pub mod units;

pub use calculation::{calculate, plan, Calculated, Calculation, CalculationState};
pub use context::{ComputeCache, Context, InputData};
pub use error::MetricError;
pub use metric::Metric;
pub use unit::{ComputationUnit, ComputedUnit, RawResult, UnitOutput};
