//! Convenient re-exports for downstream crates.

pub use crate::artifact::{ArtifactDraft, ArtifactId, ArtifactKind, RenderArtifact};
pub use crate::config::ReportConfig;
pub use crate::dataset::{Column, DataDefinition, Dataset, RegressionTask, Scalar};
pub use crate::error::{Error, Result};
pub use crate::fingerprint::{fingerprint, Fingerprint, ParamValue, Params, DEFAULT_TASK};
pub use crate::hash::Hash256;
pub use crate::manifest::{CacheSummary, ManifestId, RunManifest};
pub use crate::result::{
    Cell, MetricResult, Payload, Provenance, ResultShape, Table, Unavailable, Value,
};
pub use crate::snapshot::{
    ErrorClass, FailureRecord, MetricId, Outcome, Snapshot, SnapshotEntry,
};
