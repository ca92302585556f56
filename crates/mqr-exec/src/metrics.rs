//! Tracing hooks for per-metric outcomes.
//!
//! Only events are emitted here; subscribers are installed by the binary.

use mqr_core::snapshot::MetricId;
use mqr_metrics::{Calculated, MetricError};

pub fn record_success(id: &MetricId, calc: &Calculated) {
    tracing::trace!(
        metric = %id,
        fingerprint = %calc.fingerprint,
        state = ?calc.state,
        artifacts = calc.artifacts.len(),
        "metric calculated"
    );
}

pub fn record_failure(id: &MetricId, err: &MetricError) {
    tracing::warn!(metric = %id, class = ?err.class(), error = %err, "metric failed");
}
