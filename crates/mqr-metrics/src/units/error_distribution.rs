//! Equal-width histogram of prediction errors.

use serde::Serialize;
use serde_json::json;

use mqr_core::artifact::{ArtifactDraft, ArtifactKind};
use mqr_core::dataset::{Dataset, RegressionTask};
use mqr_core::fingerprint::{ParamValue, Params};

use crate::context::InputData;
use crate::unit::{ComputationUnit, RawResult, UnitOutput};
use crate::units::stats::observations;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: u64,
}

/// Empty when there are no usable rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDistributionResults {
    pub current: Histogram,
    pub reference: Option<Histogram>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDistributionUnit {
    bins: usize,
}

impl ErrorDistributionUnit {
    pub fn new(bins: usize) -> Self {
        Self { bins: bins.max(1) }
    }

    fn histogram(&self, data: &Dataset, task: &RegressionTask) -> Result<Histogram, String> {
        let errors: Vec<f64> = observations(data, task)?
            .iter()
            .map(|o| o.error())
            .collect();
        if errors.is_empty() {
            return Ok(Histogram { bins: Vec::new() });
        }

        let lo = errors.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // A constant error collapses into a single bin.
        let n = if hi > lo { self.bins } else { 1 };
        let width = if hi > lo { (hi - lo) / n as f64 } else { 0.0 };

        let mut counts = vec![0u64; n];
        for e in &errors {
            let idx = if width > 0.0 {
                (((e - lo) / width).floor() as usize).min(n - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                left: lo + width * i as f64,
                right: if i + 1 == n { hi } else { lo + width * (i + 1) as f64 },
                count,
            })
            .collect();
        Ok(Histogram { bins })
    }
}

impl ComputationUnit for ErrorDistributionUnit {
    type Output = ErrorDistributionResults;

    const KIND: &'static str = "error_distribution";

    fn params(&self) -> Params {
        Params::new().with("bins", ParamValue::from(self.bins))
    }

    fn compute(&self, input: &InputData<'_>) -> Result<UnitOutput<Self::Output>, String> {
        let current = self.histogram(input.current, input.task)?;
        let reference = input
            .reference
            .map(|r| self.histogram(r, input.task))
            .transpose()
            .map_err(|e| format!("reference: {e}"))?;

        let widget = ArtifactDraft::new(
            "Error Distribution",
            ArtifactKind::Histogram,
            json!({ "current": current, "reference": reference }),
        );

        Ok(UnitOutput {
            value: ErrorDistributionResults { current, reference },
            render: vec![widget],
        })
    }

    fn into_raw(output: Self::Output) -> RawResult {
        RawResult::ErrorDistribution(output)
    }

    fn from_raw(raw: &RawResult) -> Option<&Self::Output> {
        match raw {
            RawResult::ErrorDistribution(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqr_core::dataset::Column;

    #[test]
    fn counts_cover_every_row() {
        let data = Dataset::new(vec![
            Column::from_f64("target", &[0.0, 0.0, 0.0, 0.0, 0.0]),
            Column::from_f64("prediction", &[-2.0, -1.0, 0.0, 1.0, 2.0]),
        ])
        .unwrap();
        let task = RegressionTask::new("target", "prediction");
        let h = ErrorDistributionUnit::new(4).histogram(&data, &task).unwrap();
        assert_eq!(h.bins.len(), 4);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<u64>(), 5);
        assert_eq!(h.bins[0].left, -2.0);
        assert_eq!(h.bins[3].right, 2.0);
        assert_eq!(h.bins[3].count, 2);
    }

    #[test]
    fn constant_error_is_one_bin() {
        let data = Dataset::new(vec![
            Column::from_f64("target", &[1.0, 2.0]),
            Column::from_f64("prediction", &[2.0, 3.0]),
        ])
        .unwrap();
        let task = RegressionTask::new("target", "prediction");
        let h = ErrorDistributionUnit::new(10).histogram(&data, &task).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 2);
    }
}
