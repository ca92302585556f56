//! Deterministic replay helpers.
//!
//! The metrics hash is computed from the serialized metric declarations; the
//! results hash from the snapshot entries and deduplicated artifacts. Run ids
//! and timestamps are excluded, so identical inputs reproduce both hashes.

use mqr_core::artifact::RenderArtifact;
use mqr_core::hash::{hash_serde, Hash256};
use mqr_core::snapshot::SnapshotEntry;
use mqr_metrics::Metric;

use crate::ExecError;

pub fn hash_metrics(metrics: &[Metric]) -> Result<Hash256, ExecError> {
    hash_serde(&metrics).map_err(|e| ExecError::Hash(e.to_string()))
}

pub fn hash_results(
    entries: &[SnapshotEntry],
    artifacts: &[RenderArtifact],
) -> Result<Hash256, ExecError> {
    hash_serde(&(entries, artifacts)).map_err(|e| ExecError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqr_metrics::regression::{MeanAbsoluteError, MeanError};

    #[test]
    fn metrics_hash_depends_on_declaration_order() {
        let a: Vec<Metric> = vec![MeanError::new().into(), MeanAbsoluteError::new().into()];
        let b: Vec<Metric> = vec![MeanAbsoluteError::new().into(), MeanError::new().into()];
        assert_eq!(hash_metrics(&a).unwrap(), hash_metrics(&a.clone()).unwrap());
        assert_ne!(hash_metrics(&a).unwrap(), hash_metrics(&b).unwrap());
    }
}
