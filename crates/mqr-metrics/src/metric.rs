//! The closed set of metric kinds a report can declare.

use serde::{Deserialize, Serialize};

use mqr_core::config::ReportConfig;
use mqr_core::fingerprint::Fingerprint;

use crate::calculation::{calculate, plan, Calculated, Calculation};
use crate::context::Context;
use crate::error::MetricError;
use crate::regression::{
    MeanAbsoluteError, MeanError, RegressionErrorBiasDetails, RegressionErrorBiasTable,
    RegressionErrorDistribution, RegressionPredictedVsActualScatter,
};

/// One metric declaration. Serialized with its kind under `type`, so report
/// files read `{type: MAE, regression_name: prices}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Metric {
    RegressionErrorBiasTable(RegressionErrorBiasTable),
    RegressionErrorBiasDetails(RegressionErrorBiasDetails),
    #[serde(rename = "MAE")]
    Mae(MeanAbsoluteError),
    MeanError(MeanError),
    RegressionErrorDistribution(RegressionErrorDistribution),
    RegressionPredictedVsActualScatter(RegressionPredictedVsActualScatter),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Metric::RegressionErrorBiasTable($m) => $body,
            Metric::RegressionErrorBiasDetails($m) => $body,
            Metric::Mae($m) => $body,
            Metric::MeanError($m) => $body,
            Metric::RegressionErrorDistribution($m) => $body,
            Metric::RegressionPredictedVsActualScatter($m) => $body,
        }
    };
}

fn kind_of<C: Calculation>(_: &C) -> &'static str {
    C::KIND
}

impl Metric {
    pub fn kind(&self) -> &'static str {
        dispatch!(self, m => kind_of(m))
    }

    pub fn label(&self) -> Option<&str> {
        dispatch!(self, m => m.label())
    }

    pub fn display_name(&self) -> String {
        dispatch!(self, m => m.display_name())
    }

    /// Fingerprint this metric would execute under, without touching data.
    pub fn validate(&self, cfg: &ReportConfig) -> Result<Fingerprint, MetricError> {
        dispatch!(self, m => plan(m, cfg).map(|(_, fp)| fp))
    }

    pub fn calculate(&self, ctx: &Context) -> Result<Calculated, MetricError> {
        dispatch!(self, m => calculate(m, ctx))
    }
}

macro_rules! from_kind {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Metric {
                fn from(m: $ty) -> Self {
                    Metric::$variant(m)
                }
            }
        )*
    };
}

from_kind! {
    RegressionErrorBiasTable => RegressionErrorBiasTable,
    RegressionErrorBiasDetails => RegressionErrorBiasDetails,
    MeanAbsoluteError => Mae,
    MeanError => MeanError,
    RegressionErrorDistribution => RegressionErrorDistribution,
    RegressionPredictedVsActualScatter => RegressionPredictedVsActualScatter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_use_their_wire_names() {
        let m: Metric = MeanAbsoluteError::new().into();
        assert_eq!(m.kind(), "MAE");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["type"], "MAE");
        assert_eq!(v["regression_name"], "default");
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let m: Metric =
            serde_json::from_str(r#"{"type":"RegressionErrorBiasTable","columns":["age"]}"#)
                .unwrap();
        assert_eq!(
            m,
            Metric::from(RegressionErrorBiasTable::new().with_columns(["age"]))
        );
        assert_eq!(m.label(), None);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(serde_json::from_str::<Metric>(r#"{"type":"R2"}"#).is_err());
    }

    #[test]
    fn parameters_of_another_kind_are_rejected() {
        assert!(serde_json::from_str::<Metric>(r#"{"type":"MeanError","bins":5}"#).is_err());
        assert!(
            serde_json::from_str::<Metric>(r#"{"type":"RegressionErrorDistribution","bins":5}"#)
                .is_ok()
        );
    }

    #[test]
    fn validate_reports_configuration_errors() {
        let cfg = ReportConfig::default();
        let bad: Metric = RegressionErrorBiasDetails::new().with_top_error(0.7).into();
        assert!(matches!(
            bad.validate(&cfg),
            Err(MetricError::Configuration { .. })
        ));
        let good: Metric = MeanError::new().for_task("prices").into();
        assert_eq!(good.validate(&cfg).unwrap().task(), "prices");
    }
}
