//! Regression metric kinds and their calculations.
//!
//! | kind                                 | unit                | shape    |
//! |--------------------------------------|---------------------|----------|
//! | `RegressionErrorBiasTable`           | error_bias          | scalar   |
//! | `RegressionErrorBiasDetails`         | error_bias          | tabular  |
//! | `MAE`                                | regression_quality  | mean/std |
//! | `MeanError`                          | regression_quality  | mean/std |
//! | `RegressionErrorDistribution`        | error_distribution  | tabular  |
//! | `RegressionPredictedVsActualScatter` | predicted_vs_actual | scalar   |

use serde::{Deserialize, Serialize};
use serde_json::json;

use mqr_core::artifact::{ArtifactDraft, ArtifactKind};
use mqr_core::config::ReportConfig;
use mqr_core::fingerprint::DEFAULT_TASK;
use mqr_core::result::{Cell, Payload, ResultShape, Table, Unavailable, Value};

use crate::calculation::Calculation;
use crate::error::MetricError;
use crate::units::error_bias::{BiasTable, ErrorBiasResults, FeatureType};
use crate::units::error_distribution::{ErrorDistributionResults, Histogram};
use crate::units::predicted_vs_actual::{ScatterData, ScatterResults};
use crate::units::regression_quality::{QualityResults, QualityStats};
use crate::units::{
    ErrorBiasUnit, ErrorDistributionUnit, PredictedVsActualUnit, RegressionQualityUnit,
};

macro_rules! metric_builders {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Target a named regression task instead of `"default"`.
            pub fn for_task(mut self, regression_name: impl Into<String>) -> Self {
                self.regression_name = regression_name.into();
                self
            }

            /// Instance label distinguishing otherwise identical declarations.
            pub fn labelled(mut self, label: impl Into<String>) -> Self {
                self.label = Some(label.into());
                self
            }
        }
    };
}

fn check_task(kind: &str, regression_name: &str) -> Result<String, MetricError> {
    let name = regression_name.trim();
    if name.is_empty() {
        return Err(MetricError::configuration(
            kind,
            "regression_name must not be empty",
        ));
    }
    Ok(name.to_string())
}

fn resolve_top_error(
    kind: &str,
    top_error: Option<f64>,
    cfg: &ReportConfig,
) -> Result<f64, MetricError> {
    let v = top_error.unwrap_or(cfg.default_top_error);
    if !v.is_finite() || !(0.0..=0.5).contains(&v) {
        return Err(MetricError::configuration(
            kind,
            format!("top_error must be within [0, 0.5], got {v}"),
        ));
    }
    Ok(v)
}

fn check_columns(kind: &str, columns: Option<&[String]>) -> Result<(), MetricError> {
    if let Some(blank) = columns.and_then(|c| c.iter().position(|n| n.trim().is_empty())) {
        return Err(MetricError::configuration(
            kind,
            format!("columns[{blank}] is blank"),
        ));
    }
    Ok(())
}

fn empty_or(rows: usize, v: Option<f64>) -> Value {
    match v {
        Some(v) if rows > 0 => Value::Number(v),
        _ => Value::unavailable(Unavailable::EmptyInput),
    }
}

// ----- error bias -----

fn error_bias_unit(
    kind: &str,
    regression_name: &str,
    columns: Option<&[String]>,
    top_error: Option<f64>,
    cfg: &ReportConfig,
) -> Result<(ErrorBiasUnit, String), MetricError> {
    let task = check_task(kind, regression_name)?;
    check_columns(kind, columns)?;
    let top_error = resolve_top_error(kind, top_error, cfg)?;
    Ok((ErrorBiasUnit::new(columns, top_error), task))
}

/// `EmptyInput` when no rows were usable; a real zero when no features were selected.
fn features_analysed(table: &BiasTable) -> Value {
    if table.rows_used == 0 {
        Value::unavailable(Unavailable::EmptyInput)
    } else {
        Value::Number(table.features.len() as f64)
    }
}

/// Number of features analysed for error bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionErrorBiasTable {
    pub regression_name: String,
    /// Feature columns to analyse; `None` means every feature column.
    pub columns: Option<Vec<String>>,
    /// Error quantile in [0, 0.5]; `None` uses the configured default.
    pub top_error: Option<f64>,
    pub label: Option<String>,
}

impl Default for RegressionErrorBiasTable {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            columns: None,
            top_error: None,
            label: None,
        }
    }
}

metric_builders!(RegressionErrorBiasTable);

impl RegressionErrorBiasTable {
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_top_error(mut self, top_error: f64) -> Self {
        self.top_error = Some(top_error);
        self
    }
}

impl Calculation for RegressionErrorBiasTable {
    type Unit = ErrorBiasUnit;
    const KIND: &'static str = "RegressionErrorBiasTable";
    const SHAPE: ResultShape = ResultShape::Scalar;

    fn build_unit(&self, cfg: &ReportConfig) -> Result<(ErrorBiasUnit, String), MetricError> {
        error_bias_unit(
            Self::KIND,
            &self.regression_name,
            self.columns.as_deref(),
            self.top_error,
            cfg,
        )
    }

    fn adapt(&self, raw: &ErrorBiasResults) -> Result<(Payload, Option<Payload>), String> {
        Ok((
            Payload::Scalar(features_analysed(&raw.current)),
            raw.reference
                .as_ref()
                .map(|r| Payload::Scalar(features_analysed(r))),
        ))
    }

    fn display_name(&self) -> String {
        "Regression Error Bias Table".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Per-feature error bias breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionErrorBiasDetails {
    pub regression_name: String,
    pub columns: Option<Vec<String>>,
    pub top_error: Option<f64>,
    pub label: Option<String>,
}

impl Default for RegressionErrorBiasDetails {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            columns: None,
            top_error: None,
            label: None,
        }
    }
}

metric_builders!(RegressionErrorBiasDetails);

impl RegressionErrorBiasDetails {
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_top_error(mut self, top_error: f64) -> Self {
        self.top_error = Some(top_error);
        self
    }
}

fn bias_rows(table: &BiasTable) -> Result<Table, String> {
    let mut out = Table::new(["feature", "type", "majority", "under", "over", "range"]);
    for f in &table.features {
        let kind = match f.feature_type {
            FeatureType::Numerical => "num",
            FeatureType::Categorical => "cat",
        };
        out.push_row(vec![
            Cell::from(f.feature.as_str()),
            Cell::from(kind),
            f.majority.clone(),
            f.under.clone(),
            f.over.clone(),
            Cell::from(f.range),
        ])
        .map_err(|e| e.to_string())?;
    }
    Ok(out)
}

impl Calculation for RegressionErrorBiasDetails {
    type Unit = ErrorBiasUnit;
    const KIND: &'static str = "RegressionErrorBiasDetails";
    const SHAPE: ResultShape = ResultShape::Tabular;

    fn build_unit(&self, cfg: &ReportConfig) -> Result<(ErrorBiasUnit, String), MetricError> {
        error_bias_unit(
            Self::KIND,
            &self.regression_name,
            self.columns.as_deref(),
            self.top_error,
            cfg,
        )
    }

    fn adapt(&self, raw: &ErrorBiasResults) -> Result<(Payload, Option<Payload>), String> {
        let current = Payload::Tabular(bias_rows(&raw.current)?);
        let reference = match &raw.reference {
            Some(r) => Some(Payload::Tabular(bias_rows(r)?)),
            None => None,
        };
        Ok((current, reference))
    }

    fn display_name(&self) -> String {
        "Regression Error Bias Details".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

// ----- regression quality -----

/// Mean absolute error with its standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeanAbsoluteError {
    pub regression_name: String,
    pub label: Option<String>,
}

impl Default for MeanAbsoluteError {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            label: None,
        }
    }
}

metric_builders!(MeanAbsoluteError);

fn abs_error(s: &QualityStats) -> Payload {
    Payload::MeanStd {
        mean: empty_or(s.rows, s.mean_abs_error),
        std: empty_or(s.rows, s.abs_error_std),
    }
}

impl Calculation for MeanAbsoluteError {
    type Unit = RegressionQualityUnit;
    const KIND: &'static str = "MAE";
    const SHAPE: ResultShape = ResultShape::MeanStd;

    fn build_unit(
        &self,
        _cfg: &ReportConfig,
    ) -> Result<(RegressionQualityUnit, String), MetricError> {
        Ok((RegressionQualityUnit, check_task(Self::KIND, &self.regression_name)?))
    }

    fn adapt(&self, raw: &QualityResults) -> Result<(Payload, Option<Payload>), String> {
        Ok((abs_error(&raw.current), raw.reference.as_ref().map(abs_error)))
    }

    fn display_name(&self) -> String {
        "Mean Absolute Error".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn additional_artifacts(&self, raw: &QualityResults) -> Vec<ArtifactDraft> {
        vec![ArtifactDraft::new(
            "Mean Absolute Error",
            ArtifactKind::Counter,
            json!({
                "current": abs_error(&raw.current),
                "reference": raw.reference.as_ref().map(abs_error),
            }),
        )]
    }
}

/// Mean signed error (prediction - target) with its standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeanError {
    pub regression_name: String,
    pub label: Option<String>,
}

impl Default for MeanError {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            label: None,
        }
    }
}

metric_builders!(MeanError);

fn signed_error(s: &QualityStats) -> Payload {
    Payload::MeanStd {
        mean: empty_or(s.rows, s.mean_error),
        std: empty_or(s.rows, s.error_std),
    }
}

impl Calculation for MeanError {
    type Unit = RegressionQualityUnit;
    const KIND: &'static str = "MeanError";
    const SHAPE: ResultShape = ResultShape::MeanStd;

    fn build_unit(
        &self,
        _cfg: &ReportConfig,
    ) -> Result<(RegressionQualityUnit, String), MetricError> {
        Ok((RegressionQualityUnit, check_task(Self::KIND, &self.regression_name)?))
    }

    fn adapt(&self, raw: &QualityResults) -> Result<(Payload, Option<Payload>), String> {
        Ok((
            signed_error(&raw.current),
            raw.reference.as_ref().map(signed_error),
        ))
    }

    fn display_name(&self) -> String {
        "Mean Error".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

// ----- error distribution -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionErrorDistribution {
    pub regression_name: String,
    /// Histogram bins; `None` uses the configured default.
    pub bins: Option<usize>,
    pub label: Option<String>,
}

impl Default for RegressionErrorDistribution {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            bins: None,
            label: None,
        }
    }
}

metric_builders!(RegressionErrorDistribution);

impl RegressionErrorDistribution {
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }
}

fn histogram_rows(h: &Histogram) -> Result<Table, String> {
    let mut out = Table::new(["bin_left", "bin_right", "count"]);
    for b in &h.bins {
        out.push_row(vec![
            Cell::from(b.left),
            Cell::from(b.right),
            Cell::from(b.count as f64),
        ])
        .map_err(|e| e.to_string())?;
    }
    Ok(out)
}

impl Calculation for RegressionErrorDistribution {
    type Unit = ErrorDistributionUnit;
    const KIND: &'static str = "RegressionErrorDistribution";
    const SHAPE: ResultShape = ResultShape::Tabular;

    fn build_unit(
        &self,
        cfg: &ReportConfig,
    ) -> Result<(ErrorDistributionUnit, String), MetricError> {
        let task = check_task(Self::KIND, &self.regression_name)?;
        let bins = self.bins.unwrap_or(cfg.histogram_bins);
        if bins == 0 {
            return Err(MetricError::configuration(Self::KIND, "bins must be at least 1"));
        }
        Ok((ErrorDistributionUnit::new(bins), task))
    }

    fn adapt(&self, raw: &ErrorDistributionResults) -> Result<(Payload, Option<Payload>), String> {
        let current = Payload::Tabular(histogram_rows(&raw.current)?);
        let reference = match &raw.reference {
            Some(r) => Some(Payload::Tabular(histogram_rows(r)?)),
            None => None,
        };
        Ok((current, reference))
    }

    fn display_name(&self) -> String {
        "Regression Error Distribution".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

// ----- predicted vs actual -----

/// Number of points plotted; unavailable when the data had to be aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionPredictedVsActualScatter {
    pub regression_name: String,
    /// Above this many rows the scatter is aggregated; `None` uses the configured default.
    pub max_points: Option<usize>,
    pub label: Option<String>,
}

impl Default for RegressionPredictedVsActualScatter {
    fn default() -> Self {
        Self {
            regression_name: DEFAULT_TASK.to_string(),
            max_points: None,
            label: None,
        }
    }
}

metric_builders!(RegressionPredictedVsActualScatter);

impl RegressionPredictedVsActualScatter {
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = Some(max_points);
        self
    }
}

fn points_plotted(s: &ScatterData) -> Payload {
    Payload::Scalar(match s {
        ScatterData::Points { points } if points.is_empty() => {
            Value::unavailable(Unavailable::EmptyInput)
        }
        ScatterData::Points { points } => Value::Number(points.len() as f64),
        ScatterData::Aggregated { .. } => Value::unavailable(Unavailable::Aggregated),
    })
}

impl Calculation for RegressionPredictedVsActualScatter {
    type Unit = PredictedVsActualUnit;
    const KIND: &'static str = "RegressionPredictedVsActualScatter";
    const SHAPE: ResultShape = ResultShape::Scalar;

    fn build_unit(
        &self,
        cfg: &ReportConfig,
    ) -> Result<(PredictedVsActualUnit, String), MetricError> {
        let task = check_task(Self::KIND, &self.regression_name)?;
        let max_points = self.max_points.unwrap_or(cfg.scatter_max_points);
        if max_points == 0 {
            return Err(MetricError::configuration(
                Self::KIND,
                "max_points must be at least 1",
            ));
        }
        Ok((PredictedVsActualUnit::new(max_points), task))
    }

    fn adapt(&self, raw: &ScatterResults) -> Result<(Payload, Option<Payload>), String> {
        Ok((
            points_plotted(&raw.current),
            raw.reference.as_ref().map(points_plotted),
        ))
    }

    fn display_name(&self) -> String {
        "Regression Predicted vs Actual".to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
