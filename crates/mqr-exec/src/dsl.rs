//! YAML report definitions.
//!
//! Example:
//! ```yaml
//! config: { max_parallel_tasks: 4, histogram_bins: 10 }
//! tasks:
//!   - { name: prices, target: price, prediction: predicted_price }
//! metrics:
//!   - { type: RegressionErrorBiasTable, regression_name: prices, columns: [age] }
//!   - { type: MAE, regression_name: prices }
//!   - { type: RegressionErrorDistribution, regression_name: prices, bins: 5 }
//! ```
//!
//! When `tasks` is omitted a `default` task over `target`/`prediction` is assumed.

use serde::{Deserialize, Serialize};

use mqr_core::config::ReportConfig;
use mqr_core::dataset::{DataDefinition, RegressionTask};
use mqr_metrics::Metric;

use crate::ExecError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportDoc {
    #[serde(default)]
    config: Option<ReportConfigDoc>,
    #[serde(default)]
    tasks: Option<Vec<RegressionTask>>,
    metrics: Vec<Metric>,
}

/// Per-file overrides layered over environment defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfigDoc {
    pub max_parallel_tasks: Option<usize>,
    pub default_top_error: Option<f64>,
    pub histogram_bins: Option<usize>,
    pub scatter_max_points: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub metrics: Vec<Metric>,
    pub definition: DataDefinition,
    pub config: ReportConfigDoc,
}

pub fn parse_yaml_report(yaml_src: &str) -> Result<ParsedReport, ExecError> {
    let doc: ReportDoc =
        serde_yaml::from_str(yaml_src).map_err(|e| ExecError::Definition(e.to_string()))?;

    let tasks = doc
        .tasks
        .unwrap_or_else(|| vec![RegressionTask::new("target", "prediction")]);
    let mut definition = DataDefinition::new();
    for task in tasks {
        if task.name.trim().is_empty() {
            return Err(ExecError::Definition("task name must not be empty".into()));
        }
        if definition.resolve(&task.name).is_some() {
            return Err(ExecError::Definition(format!(
                "duplicate task '{}'",
                task.name
            )));
        }
        definition.add_regression_task(task);
    }

    Ok(ParsedReport {
        metrics: doc.metrics,
        definition,
        config: doc.config.unwrap_or_default(),
    })
}

pub fn apply_report_config(cfg: &mut ReportConfig, doc: &ReportConfigDoc) {
    if let Some(n) = doc.max_parallel_tasks {
        cfg.max_parallel_tasks = n.max(1);
    }
    if let Some(v) = doc.default_top_error {
        cfg.default_top_error = v;
    }
    if let Some(n) = doc.histogram_bins {
        cfg.histogram_bins = n;
    }
    if let Some(n) = doc.scatter_max_points {
        cfg.scatter_max_points = n;
    }
}
