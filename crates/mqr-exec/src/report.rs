//! Runtime: run a report's metrics against one fresh context and emit a snapshot.
//!
//! - Every run builds its own `Context`, so nothing is cached across runs.
//! - Metrics execute through the scheduler; entries keep declared order.
//! - A failing metric occupies its own slot and never aborts its siblings.
//! - Artifacts are deduplicated by id in first-appearance order.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{info, info_span};

use mqr_core::artifact::RenderArtifact;
use mqr_core::config::ReportConfig;
use mqr_core::dataset::{DataDefinition, Dataset};
use mqr_core::fingerprint::Fingerprint;
use mqr_core::manifest::RunManifest;
use mqr_core::snapshot::{MetricId, Outcome, Snapshot, SnapshotEntry};
use mqr_metrics::error::panic_message;
use mqr_metrics::{Calculated, Context, Metric, MetricError};

use crate::replay::{hash_metrics, hash_results};
use crate::{metrics, scheduler};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("report definition: {0}")]
    Definition(String),
    #[error("worker pool: {0}")]
    Pool(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

/// An ordered list of metric declarations plus the configuration to run them with.
#[derive(Debug, Clone)]
pub struct Report {
    metrics: Vec<Metric>,
    config: ReportConfig,
}

impl Report {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self {
            metrics,
            config: ReportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Stable per-entry ids: kind, optional label, and an ordinal among
    /// earlier declarations with the same kind and label.
    pub fn metric_ids(&self) -> Vec<MetricId> {
        let mut seen: HashMap<(&str, Option<&str>), usize> = HashMap::new();
        self.metrics
            .iter()
            .map(|m| {
                let n = seen.entry((m.kind(), m.label())).or_insert(0);
                let id = MetricId {
                    kind: m.kind().to_string(),
                    label: m.label().map(str::to_string),
                    ordinal: *n,
                };
                *n += 1;
                id
            })
            .collect()
    }

    /// Check every declaration's configuration without touching data.
    pub fn validate(&self) -> Vec<(MetricId, Result<Fingerprint, MetricError>)> {
        self.metric_ids()
            .into_iter()
            .zip(&self.metrics)
            .map(|(id, m)| (id, m.validate(&self.config)))
            .collect()
    }

    /// Execute every metric once against `current` (and `reference`, when given).
    pub fn run(
        &self,
        current: Dataset,
        reference: Option<Dataset>,
        definition: DataDefinition,
    ) -> Result<Snapshot, ExecError> {
        let span = info_span!(
            "report.run",
            metrics = self.metrics.len(),
            reference = reference.is_some(),
            workers = self.config.max_parallel_tasks
        );
        let _enter = span.enter();

        let metrics_hash = hash_metrics(&self.metrics)?;
        let mut manifest = RunManifest::new(metrics_hash, reference.is_some(), now_millis());
        let ctx = Context::new(current, reference, definition, self.config.clone());

        let outcomes = scheduler::execute(
            &self.metrics,
            self.config.max_parallel_tasks,
            |metric| calculate_isolated(metric, &ctx),
        )?;

        let mut entries = Vec::with_capacity(self.metrics.len());
        let mut artifacts: Vec<RenderArtifact> = Vec::new();
        let mut seen = HashSet::new();

        for ((metric, id), outcome) in self.metrics.iter().zip(self.metric_ids()).zip(outcomes) {
            let outcome = match outcome {
                Ok(calc) => {
                    metrics::record_success(&id, &calc);
                    for artifact in &calc.artifacts {
                        if seen.insert(artifact.id) {
                            artifacts.push(RenderArtifact::clone(artifact));
                        }
                    }
                    manifest.succeeded.push(id.to_string());
                    Outcome::Ok(calc.result)
                }
                Err(err) => {
                    metrics::record_failure(&id, &err);
                    manifest.failed.push(id.to_string());
                    Outcome::Failed(err.to_record())
                }
            };
            entries.push(SnapshotEntry {
                kind: id.kind.clone(),
                id,
                display_name: metric.display_name(),
                outcome,
            });
        }

        let results_hash = hash_results(&entries, &artifacts)?;
        let cache = ctx.cache().stats().summary();
        let manifest = manifest.finish(now_millis(), results_hash, cache);

        info!(
            succeeded = manifest.succeeded.len(),
            failed = manifest.failed.len(),
            executions = cache.executions,
            served = cache.served,
            artifacts = artifacts.len(),
            elapsed_ms = manifest.finished_ms.saturating_sub(manifest.started_ms),
            "report finished"
        );

        Ok(Snapshot {
            manifest,
            entries,
            artifacts,
        })
    }
}

/// Run one metric, turning a panic outside the unit into a failure confined
/// to its slot. Unit panics are already cached as computation failures.
fn calculate_isolated(metric: &Metric, ctx: &Context) -> Result<Calculated, MetricError> {
    panic::catch_unwind(AssertUnwindSafe(|| metric.calculate(ctx))).unwrap_or_else(|payload| {
        let fingerprint = metric
            .validate(ctx.config())
            .map(|fp| fp.to_string())
            .unwrap_or_default();
        Err(MetricError::Computation {
            fingerprint,
            message: format!("panicked: {}", panic_message(payload.as_ref())),
        })
    })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
