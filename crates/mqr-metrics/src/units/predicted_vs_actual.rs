//! Predicted-vs-actual scatter, aggregated into a grid for large inputs.

use serde::Serialize;
use serde_json::json;

use mqr_core::artifact::{ArtifactDraft, ArtifactKind};
use mqr_core::dataset::{Dataset, RegressionTask};
use mqr_core::fingerprint::{ParamValue, Params};

use crate::context::InputData;
use crate::unit::{ComputationUnit, RawResult, UnitOutput};
use crate::units::stats::observations;

pub const GRID_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScatterData {
    /// `[actual, predicted]` pairs.
    Points { points: Vec<[f64; 2]> },
    /// Counts on a `GRID_SIZE` x `GRID_SIZE` grid; rows index actual, columns predicted.
    Aggregated {
        rows: usize,
        actual_range: [f64; 2],
        predicted_range: [f64; 2],
        counts: Vec<Vec<u64>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterResults {
    pub current: ScatterData,
    pub reference: Option<ScatterData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedVsActualUnit {
    max_points: usize,
}

impl PredictedVsActualUnit {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(1),
        }
    }

    fn scatter(&self, data: &Dataset, task: &RegressionTask) -> Result<ScatterData, String> {
        let obs = observations(data, task)?;
        if obs.len() <= self.max_points {
            return Ok(ScatterData::Points {
                points: obs.iter().map(|o| [o.target, o.prediction]).collect(),
            });
        }

        let range = |f: fn(&crate::units::stats::Observation) -> f64| -> [f64; 2] {
            let lo = obs.iter().map(f).fold(f64::INFINITY, f64::min);
            let hi = obs.iter().map(f).fold(f64::NEG_INFINITY, f64::max);
            [lo, hi]
        };
        let actual_range = range(|o| o.target);
        let predicted_range = range(|o| o.prediction);

        let cell = |v: f64, [lo, hi]: [f64; 2]| -> usize {
            if hi > lo {
                (((v - lo) / (hi - lo) * GRID_SIZE as f64).floor() as usize).min(GRID_SIZE - 1)
            } else {
                0
            }
        };
        let mut counts = vec![vec![0u64; GRID_SIZE]; GRID_SIZE];
        for o in &obs {
            counts[cell(o.target, actual_range)][cell(o.prediction, predicted_range)] += 1;
        }

        Ok(ScatterData::Aggregated {
            rows: obs.len(),
            actual_range,
            predicted_range,
            counts,
        })
    }
}

impl ComputationUnit for PredictedVsActualUnit {
    type Output = ScatterResults;

    const KIND: &'static str = "predicted_vs_actual";

    fn params(&self) -> Params {
        Params::new().with("max_points", ParamValue::from(self.max_points))
    }

    fn compute(&self, input: &InputData<'_>) -> Result<UnitOutput<Self::Output>, String> {
        let current = self.scatter(input.current, input.task)?;
        let reference = input
            .reference
            .map(|r| self.scatter(r, input.task))
            .transpose()
            .map_err(|e| format!("reference: {e}"))?;

        let widget = ArtifactDraft::new(
            "Predicted vs Actual",
            ArtifactKind::Scatter,
            json!({ "current": current, "reference": reference }),
        );

        Ok(UnitOutput {
            value: ScatterResults { current, reference },
            render: vec![widget],
        })
    }

    fn into_raw(output: Self::Output) -> RawResult {
        RawResult::PredictedVsActual(output)
    }

    fn from_raw(raw: &RawResult) -> Option<&Self::Output> {
        match raw {
            RawResult::PredictedVsActual(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqr_core::dataset::Column;

    fn data(rows: usize) -> Dataset {
        let t: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        let p: Vec<f64> = (0..rows).map(|i| i as f64 + 0.5).collect();
        Dataset::new(vec![Column::from_f64("y", &t), Column::from_f64("y_hat", &p)]).unwrap()
    }

    #[test]
    fn small_inputs_keep_points() {
        let task = RegressionTask::new("y", "y_hat");
        let s = PredictedVsActualUnit::new(10).scatter(&data(10), &task).unwrap();
        assert!(matches!(s, ScatterData::Points { ref points } if points.len() == 10));
    }

    #[test]
    fn large_inputs_are_aggregated() {
        let task = RegressionTask::new("y", "y_hat");
        let s = PredictedVsActualUnit::new(10).scatter(&data(50), &task).unwrap();
        match s {
            ScatterData::Aggregated { rows, counts, .. } => {
                assert_eq!(rows, 50);
                assert_eq!(counts.iter().flatten().sum::<u64>(), 50);
            }
            other => panic!("expected aggregation, got {other:?}"),
        }
    }
}
