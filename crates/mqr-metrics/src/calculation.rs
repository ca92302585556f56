//! The bridge between a metric's configuration and a computation unit.
//!
//! Invocation states: `Requested -> Served` on a cache hit, otherwise
//! `Requested -> Executing -> Succeeded | Failed`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use mqr_cache::Resolution;
use mqr_core::artifact::{ArtifactDraft, ArtifactId, RenderArtifact};
use mqr_core::config::ReportConfig;
use mqr_core::fingerprint::{fingerprint, Fingerprint};
use mqr_core::result::{MetricResult, Payload, Provenance, ResultShape};

use crate::context::Context;
use crate::error::MetricError;
use crate::unit::{ComputationUnit, ComputedUnit};

/// Paired 1:1 with a metric kind.
///
/// Calculations read metric configuration and never write it. `display_name`
/// is presentation only and never influences fingerprinting.
pub trait Calculation {
    type Unit: ComputationUnit;

    /// Metric kind name as users write it.
    const KIND: &'static str;

    /// Result shape, fixed per kind.
    const SHAPE: ResultShape;

    /// Map configuration onto a unit and the task it targets. Fails fast on
    /// missing or out-of-range parameters.
    fn build_unit(&self, cfg: &ReportConfig) -> Result<(Self::Unit, String), MetricError>;

    /// Shape the raw output into `(current, reference)` payloads.
    fn adapt(&self, raw: &<Self::Unit as ComputationUnit>::Output) -> Result<(Payload, Option<Payload>), String>;

    fn display_name(&self) -> String;

    fn label(&self) -> Option<&str>;

    /// Supplementary widgets owned by this metric kind rather than the unit.
    fn additional_artifacts(&self, _raw: &<Self::Unit as ComputationUnit>::Output) -> Vec<ArtifactDraft> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationState {
    Served,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Calculated {
    pub result: MetricResult,
    /// Unit artifacts (shared with every metric on the same fingerprint)
    /// followed by this metric's supplementary ones.
    pub artifacts: Vec<Arc<RenderArtifact>>,
    pub fingerprint: Fingerprint,
    pub state: CalculationState,
}

/// Build the unit and its fingerprint without touching any data.
pub fn plan<C: Calculation>(
    calc: &C,
    cfg: &ReportConfig,
) -> Result<(C::Unit, Fingerprint), MetricError> {
    let (unit, task) = calc.build_unit(cfg)?;
    let fp = fingerprint(<C::Unit as ComputationUnit>::KIND, unit.params(), Some(&task));
    Ok((unit, fp))
}

/// Run one calculation against the context's single-flight cache.
pub fn calculate<C: Calculation>(calc: &C, ctx: &Context) -> Result<Calculated, MetricError> {
    let (unit, fp) = plan(calc, ctx.config())?;
    let task = ctx.resolve_task(fp.task(), C::KIND)?;
    let input = ctx.input_data(task);

    let (computed, resolution) = ctx.cache().get_or_compute(&fp, || {
        // A panic is published as this key's failure so all sharers see one error.
        let out = panic::catch_unwind(AssertUnwindSafe(|| unit.compute(&input)))
            .map_err(|payload| MetricError::panicked(&fp, payload.as_ref()))?
            .map_err(|message| MetricError::computation(&fp, message))?;
        Ok(Arc::new(ComputedUnit::seal(
            &fp,
            <C::Unit as ComputationUnit>::into_raw(out.value),
            out.render,
        )))
    });

    let state = match (&computed, resolution) {
        (Err(_), _) => CalculationState::Failed,
        (Ok(_), Resolution::Served) => CalculationState::Served,
        (Ok(_), Resolution::Executed) => CalculationState::Succeeded,
    };
    debug!(metric = C::KIND, fingerprint = %fp, ?state, "calculation resolved");
    let computed = computed?;

    let raw = <C::Unit as ComputationUnit>::from_raw(&computed.raw).ok_or_else(|| {
        MetricError::adaptation(
            C::KIND,
            &fp,
            format!(
                "expected {} output, found {}",
                <C::Unit as ComputationUnit>::KIND,
                computed.raw.family()
            ),
        )
    })?;

    let (current, reference) = calc
        .adapt(raw)
        .map_err(|reason| MetricError::adaptation(C::KIND, &fp, reason))?;
    let reference = reference.filter(|_| ctx.reference().is_some());

    let mut artifacts = computed.artifacts.clone();
    for (i, draft) in calc.additional_artifacts(raw).into_iter().enumerate() {
        let id = ArtifactId::derive(fp.digest(), &format!("{}/{i}", C::KIND));
        artifacts.push(Arc::new(draft.seal(id)));
    }

    let result = MetricResult::new(C::SHAPE, current, reference)
        .map_err(|e| MetricError::adaptation(C::KIND, &fp, e.to_string()))?
        .with_artifacts(artifacts.iter().map(|a| a.id).collect())
        .with_provenance(Provenance::new(Arc::clone(&computed)));

    Ok(Calculated {
        result,
        artifacts,
        fingerprint: fp,
        state,
    })
}
