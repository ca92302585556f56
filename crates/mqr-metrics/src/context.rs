//! Per-run execution environment.
//!
//! The context owns the datasets (read-only for the whole run), the task
//! registry, the report configuration, and the run's execution cache. A fresh
//! context means a fresh, empty cache; nothing persists across runs.

use std::sync::Arc;

use mqr_cache::ExecutionCache;
use mqr_core::config::ReportConfig;
use mqr_core::dataset::{DataDefinition, Dataset, RegressionTask};
use mqr_core::fingerprint::Fingerprint;

use crate::error::MetricError;
use crate::unit::ComputedUnit;

pub type ComputeCache = ExecutionCache<Fingerprint, Arc<ComputedUnit>, MetricError>;

/// Borrowed view handed to a computation unit.
#[derive(Debug, Clone, Copy)]
pub struct InputData<'a> {
    pub current: &'a Dataset,
    pub reference: Option<&'a Dataset>,
    pub task: &'a RegressionTask,
    pub definition: &'a DataDefinition,
}

pub struct Context {
    current: Dataset,
    reference: Option<Dataset>,
    definition: DataDefinition,
    config: ReportConfig,
    cache: ComputeCache,
}

impl Context {
    pub fn new(
        current: Dataset,
        reference: Option<Dataset>,
        definition: DataDefinition,
        config: ReportConfig,
    ) -> Self {
        Self {
            current,
            reference,
            definition,
            config,
            cache: ComputeCache::new(),
        }
    }

    pub fn current(&self) -> &Dataset {
        &self.current
    }

    pub fn reference(&self) -> Option<&Dataset> {
        self.reference.as_ref()
    }

    pub fn definition(&self) -> &DataDefinition {
        &self.definition
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn cache(&self) -> &ComputeCache {
        &self.cache
    }

    /// Resolve a task name; an unknown task is a configuration error of `metric`.
    pub fn resolve_task(&self, name: &str, metric: &str) -> Result<&RegressionTask, MetricError> {
        self.definition.resolve(name).ok_or_else(|| {
            let known: Vec<&str> = self.definition.task_names().collect();
            MetricError::configuration(
                metric,
                format!(
                    "unknown regression task '{name}' (known: [{}])",
                    known.join(", ")
                ),
            )
        })
    }

    pub fn input_data<'a>(&'a self, task: &'a RegressionTask) -> InputData<'a> {
        InputData {
            current: &self.current,
            reference: self.reference.as_ref(),
            task,
            definition: &self.definition,
        }
    }
}
