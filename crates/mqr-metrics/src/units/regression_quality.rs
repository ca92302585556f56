//! Error and absolute-error moments for a regression task.

use serde::Serialize;
use serde_json::json;

use mqr_core::artifact::{ArtifactDraft, ArtifactKind};
use mqr_core::dataset::{Dataset, RegressionTask};
use mqr_core::fingerprint::Params;

use crate::context::InputData;
use crate::unit::{ComputationUnit, RawResult, UnitOutput};
use crate::units::stats::{mean, observations, std_dev};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityStats {
    pub rows: usize,
    /// `None` when `rows == 0`.
    pub mean_error: Option<f64>,
    pub error_std: Option<f64>,
    pub mean_abs_error: Option<f64>,
    pub abs_error_std: Option<f64>,
}

impl QualityStats {
    fn compute(data: &Dataset, task: &RegressionTask) -> Result<Self, String> {
        let errors: Vec<f64> = observations(data, task)?
            .iter()
            .map(|o| o.error())
            .collect();
        let abs: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        Ok(Self {
            rows: errors.len(),
            mean_error: mean(&errors),
            error_std: std_dev(&errors),
            mean_abs_error: mean(&abs),
            abs_error_std: std_dev(&abs),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityResults {
    pub current: QualityStats,
    pub reference: Option<QualityStats>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressionQualityUnit;

impl ComputationUnit for RegressionQualityUnit {
    type Output = QualityResults;

    const KIND: &'static str = "regression_quality";

    fn params(&self) -> Params {
        Params::new()
    }

    fn compute(&self, input: &InputData<'_>) -> Result<UnitOutput<Self::Output>, String> {
        let current = QualityStats::compute(input.current, input.task)?;
        let reference = input
            .reference
            .map(|r| QualityStats::compute(r, input.task))
            .transpose()
            .map_err(|e| format!("reference: {e}"))?;

        let widget = ArtifactDraft::new(
            "Regression Quality",
            ArtifactKind::Counter,
            json!({ "current": current, "reference": reference }),
        );

        Ok(UnitOutput {
            value: QualityResults { current, reference },
            render: vec![widget],
        })
    }

    fn into_raw(output: Self::Output) -> RawResult {
        RawResult::RegressionQuality(output)
    }

    fn from_raw(raw: &RawResult) -> Option<&Self::Output> {
        match raw {
            RawResult::RegressionQuality(r) => Some(r),
            _ => None,
        }
    }
}
