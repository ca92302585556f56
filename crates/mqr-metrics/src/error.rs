use std::any::Any;

use thiserror::Error;

use mqr_cache::Interrupted;
use mqr_core::fingerprint::Fingerprint;
use mqr_core::snapshot::{ErrorClass, FailureRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Parameters cannot be mapped onto a valid computation request.
    /// Raised before any cache interaction and never cached.
    #[error("invalid configuration for {metric}: {reason}")]
    Configuration { metric: String, reason: String },

    /// The computation unit itself failed. Cached against its fingerprint.
    #[error("computation {fingerprint} failed: {message}")]
    Computation { fingerprint: String, message: String },

    /// A successful raw result could not be shaped into the metric's result.
    #[error("cannot adapt {fingerprint} for {metric}: {reason}")]
    Adaptation {
        metric: String,
        fingerprint: String,
        reason: String,
    },
}

impl MetricError {
    pub fn configuration(metric: &str, reason: impl Into<String>) -> Self {
        MetricError::Configuration {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }

    pub fn computation(fingerprint: &Fingerprint, message: impl Into<String>) -> Self {
        MetricError::Computation {
            fingerprint: fingerprint.to_string(),
            message: message.into(),
        }
    }

    /// A unit that panicked; every requester of `fingerprint` sees this error.
    pub fn panicked(fingerprint: &Fingerprint, payload: &(dyn Any + Send)) -> Self {
        Self::computation(fingerprint, format!("panicked: {}", panic_message(payload)))
    }

    pub fn adaptation(metric: &str, fingerprint: &Fingerprint, reason: impl Into<String>) -> Self {
        MetricError::Adaptation {
            metric: metric.to_string(),
            fingerprint: fingerprint.to_string(),
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            MetricError::Configuration { .. } => ErrorClass::Configuration,
            MetricError::Computation { .. } => ErrorClass::Computation,
            MetricError::Adaptation { .. } => ErrorClass::Adaptation,
        }
    }

    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            MetricError::Configuration { .. } => None,
            MetricError::Computation { fingerprint, .. }
            | MetricError::Adaptation { fingerprint, .. } => Some(fingerprint),
        }
    }

    /// Serializable form placed in the failing metric's snapshot slot.
    pub fn to_record(&self) -> FailureRecord {
        FailureRecord {
            class: self.class(),
            message: self.to_string(),
            fingerprint: self.fingerprint().map(str::to_string),
        }
    }
}

/// Text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

impl From<Interrupted> for MetricError {
    fn from(e: Interrupted) -> Self {
        MetricError::Computation {
            fingerprint: e.key,
            message: "computation panicked before completing".to_string(),
        }
    }
}
