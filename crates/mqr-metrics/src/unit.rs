//! Computation unit contract and the closed set of raw result families.

use std::sync::Arc;

use mqr_core::artifact::{ArtifactDraft, ArtifactId, RenderArtifact};
use mqr_core::fingerprint::{Fingerprint, Params};

use crate::context::InputData;
use crate::units::error_bias::ErrorBiasResults;
use crate::units::error_distribution::ErrorDistributionResults;
use crate::units::predicted_vs_actual::ScatterResults;
use crate::units::regression_quality::QualityResults;

/// Output of one unit execution: the typed value plus any widgets it renders.
#[derive(Debug)]
pub struct UnitOutput<T> {
    pub value: T,
    pub render: Vec<ArtifactDraft>,
}

/// An opaque, possibly slow unit of work identified by its parameters.
///
/// Invariants:
/// - `params` must capture every input that influences `compute`; equal
///   params (under the same `KIND` and task) must mean an identical result.
/// - `compute` must not mutate its inputs and must compute the reference half
///   only when a reference dataset is supplied.
pub trait ComputationUnit: Send {
    type Output: Send + Sync + 'static;

    /// Stable kind identifier; first component of the fingerprint.
    const KIND: &'static str;

    fn params(&self) -> Params;

    fn compute(&self, input: &InputData<'_>) -> Result<UnitOutput<Self::Output>, String>;

    fn into_raw(output: Self::Output) -> RawResult;

    fn from_raw(raw: &RawResult) -> Option<&Self::Output>;
}

/// Raw results, one variant per unit family.
#[derive(Debug)]
pub enum RawResult {
    ErrorBias(ErrorBiasResults),
    RegressionQuality(QualityResults),
    ErrorDistribution(ErrorDistributionResults),
    PredictedVsActual(ScatterResults),
}

impl RawResult {
    pub fn family(&self) -> &'static str {
        match self {
            RawResult::ErrorBias(_) => "error_bias",
            RawResult::RegressionQuality(_) => "regression_quality",
            RawResult::ErrorDistribution(_) => "error_distribution",
            RawResult::PredictedVsActual(_) => "predicted_vs_actual",
        }
    }
}

/// What the execution cache stores per fingerprint.
#[derive(Debug)]
pub struct ComputedUnit {
    pub fingerprint: Fingerprint,
    pub raw: RawResult,
    pub artifacts: Vec<Arc<RenderArtifact>>,
}

impl ComputedUnit {
    /// Bind rendered drafts to identities derived from the owning fingerprint.
    pub fn seal(fingerprint: &Fingerprint, raw: RawResult, render: Vec<ArtifactDraft>) -> Self {
        let artifacts = render
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let id = ArtifactId::derive(fingerprint.digest(), &format!("render/{i}"));
                Arc::new(draft.seal(id))
            })
            .collect();
        Self {
            fingerprint: fingerprint.clone(),
            raw,
            artifacts,
        }
    }
}
