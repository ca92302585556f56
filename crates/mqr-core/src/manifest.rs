//! Per-run manifest for audit.
//!
//! `results_hash` covers only the result listing and artifacts, so two runs
//! over identical inputs agree on it even though ids and timestamps differ.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

/// Execution-cache counters observed over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    /// Computation units actually executed.
    pub executions: u64,
    /// Requests answered from an existing entry (done, failed, or in flight).
    pub served: u64,
    /// Executions that ended in failure.
    pub failures: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Stable hash of the declared metric list.
    pub metrics_hash: Hash256,

    /// Stable hash of entries + artifacts; set when the run finishes.
    pub results_hash: Option<Hash256>,

    pub with_reference: bool,

    /// Metric ids, in declared order, split by outcome.
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,

    pub cache: CacheSummary,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(metrics_hash: Hash256, with_reference: bool, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            engine_version: crate::VERSION.to_string(),
            metrics_hash,
            results_hash: None,
            with_reference,
            succeeded: Vec::new(),
            failed: Vec::new(),
            cache: CacheSummary::default(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, results_hash: Hash256, cache: CacheSummary) -> Self {
        self.finished_ms = finished_ms;
        self.results_hash = Some(results_hash);
        self.cache = cache;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
