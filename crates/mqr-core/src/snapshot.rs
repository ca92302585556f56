//! Report output: one entry per declared metric, in declared order, plus the
//! deduplicated artifact list.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::artifact::RenderArtifact;
use crate::manifest::RunManifest;
use crate::result::MetricResult;

/// Identity of a metric inside one report.
///
/// `ordinal` counts earlier metrics with the same kind and label, so repeated
/// identical declarations still get distinct slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricId {
    pub kind: String,
    pub label: Option<String>,
    pub ordinal: usize,
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(label) = &self.label {
            write!(f, "[{label}]")?;
        }
        if self.ordinal > 0 {
            write!(f, "#{}", self.ordinal)?;
        }
        Ok(())
    }
}

impl Serialize for MetricId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Configuration,
    Computation,
    Adaptation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub class: ErrorClass,
    pub message: String,
    /// Kind, task, and parameters of the computation involved, when one was built.
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok(MetricResult),
    Failed(FailureRecord),
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub id: MetricId,
    pub kind: String,
    pub display_name: String,
    pub outcome: Outcome,
}

impl SnapshotEntry {
    pub fn result(&self) -> Option<&MetricResult> {
        match &self.outcome {
            Outcome::Ok(r) => Some(r),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match &self.outcome {
            Outcome::Ok(_) => None,
            Outcome::Failed(f) => Some(f),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub manifest: RunManifest,
    pub entries: Vec<SnapshotEntry>,
    pub artifacts: Vec<RenderArtifact>,
}

impl Snapshot {
    /// Look up an entry by its rendered id (`Kind`, `Kind[label]`, `Kind#1`).
    pub fn get(&self, id: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.id.to_string() == id)
    }

    /// First successful result of the given kind.
    pub fn metric_result(&self, kind: &str) -> Option<&MetricResult> {
        self.entries
            .iter()
            .filter(|e| e.id.kind == kind)
            .find_map(SnapshotEntry::result)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter().filter(|e| e.result().is_some())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter().filter(|e| e.failure().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_id_rendering() {
        let plain = MetricId {
            kind: "MAE".into(),
            label: None,
            ordinal: 0,
        };
        let labelled = MetricId {
            kind: "MAE".into(),
            label: Some("price".into()),
            ordinal: 2,
        };
        assert_eq!(plain.to_string(), "MAE");
        assert_eq!(labelled.to_string(), "MAE[price]#2");
        assert_eq!(serde_json::to_string(&labelled).unwrap(), r#""MAE[price]#2""#);
    }

    #[test]
    fn failed_outcome_is_tagged() {
        let outcome = Outcome::Failed(FailureRecord {
            class: ErrorClass::Computation,
            message: "boom".into(),
            fingerprint: None,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["class"], "computation");
    }
}
