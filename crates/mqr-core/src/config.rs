//! Report configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Worker threads used to evaluate metrics. `1` evaluates sequentially.
    pub max_parallel_tasks: usize,

    /// Error quantile used by error-bias metrics that do not set one.
    pub default_top_error: f64,

    /// Histogram bins used by error-distribution metrics that do not set one.
    pub histogram_bins: usize,

    /// Above this many rows, predicted-vs-actual data is aggregated.
    pub scatter_max_points: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 1,
            default_top_error: 0.05,
            histogram_bins: 20,
            scatter_max_points: 10_000,
        }
    }
}

impl ReportConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `MQR_MAX_PARALLEL_TASKS`: worker threads (values below 1 are clamped)
    /// - `MQR_DEFAULT_TOP_ERROR`: default error quantile
    /// - `MQR_HISTOGRAM_BINS`: default histogram bins
    /// - `MQR_SCATTER_MAX_POINTS`: scatter aggregation threshold
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("MQR_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v.max(1);
            }
        }

        if let Ok(s) = std::env::var("MQR_DEFAULT_TOP_ERROR") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.default_top_error = v;
            }
        }

        if let Ok(s) = std::env::var("MQR_HISTOGRAM_BINS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.histogram_bins = v;
            }
        }

        if let Ok(s) = std::env::var("MQR_SCATTER_MAX_POINTS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.scatter_max_points = v;
            }
        }

        cfg
    }

    /// Whether metrics should be spread over a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.max_parallel_tasks > 1
    }
}
