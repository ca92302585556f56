//! Uniform result model exposed to report callers.
//!
//! Every metric kind produces one fixed `ResultShape`; payloads are checked
//! against it when a `MetricResult` is built. "Not computed" is always a
//! tagged [`Unavailable`] marker, never a magic number.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::error::{Error, Result};

/// Why a value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// The input was aggregated before the value could be observed.
    Aggregated,
    /// There were no usable rows to compute from.
    EmptyInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Unavailable { unavailable: Unavailable },
}

impl Value {
    pub fn unavailable(reason: Unavailable) -> Self {
        Value::Unavailable {
            unavailable: reason,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<Unavailable> {
        match self {
            Value::Number(_) => None,
            Value::Unavailable { unavailable } => Some(*unavailable),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Missing)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Invariant(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    Scalar,
    MeanStd,
    Tabular,
}

impl ResultShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultShape::Scalar => "scalar",
            ResultShape::MeanStd => "mean_std",
            ResultShape::Tabular => "tabular",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Scalar(Value),
    MeanStd { mean: Value, std: Value },
    Tabular(Table),
}

impl Payload {
    pub fn shape(&self) -> ResultShape {
        match self {
            Payload::Scalar(_) => ResultShape::Scalar,
            Payload::MeanStd { .. } => ResultShape::MeanStd,
            Payload::Tabular(_) => ResultShape::Tabular,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Payload::Tabular(t) => Some(t),
            _ => None,
        }
    }
}

/// Opaque handle on the raw computation a result was derived from.
///
/// Two results share provenance iff they point at the same allocation; value
/// equality is irrelevant.
#[derive(Clone)]
pub struct Provenance(Arc<dyn Any + Send + Sync>);

impl Provenance {
    pub fn new<T: Any + Send + Sync>(source: Arc<T>) -> Self {
        Self(source)
    }

    pub fn same_source(&self, other: &Provenance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provenance({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    pub shape: ResultShape,
    pub current: Payload,
    /// Absent when no reference dataset was supplied or none was computed.
    pub reference: Option<Payload>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactId>,
    #[serde(skip)]
    provenance: Option<Provenance>,
}

impl MetricResult {
    pub fn new(shape: ResultShape, current: Payload, reference: Option<Payload>) -> Result<Self> {
        check_shape(shape, &current)?;
        if let Some(r) = &reference {
            check_shape(shape, r)?;
        }
        Ok(Self {
            shape,
            current,
            reference,
            artifacts: Vec::new(),
            provenance: None,
        })
    }

    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactId>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }
}

fn check_shape(expected: ResultShape, payload: &Payload) -> Result<()> {
    let actual = payload.shape();
    if actual != expected {
        return Err(Error::Shape {
            expected: expected.as_str(),
            actual: actual.as_str(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_reference_shape_is_rejected() {
        let err = MetricResult::new(
            ResultShape::Scalar,
            Payload::Scalar(Value::Number(1.0)),
            Some(Payload::Tabular(Table::new(["a"]))),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Shape {
                expected: "scalar",
                actual: "tabular"
            }
        ));
    }

    #[test]
    fn unavailable_markers_are_tagged_and_distinct() {
        let aggregated = Value::unavailable(Unavailable::Aggregated);
        let empty = Value::unavailable(Unavailable::EmptyInput);
        assert_ne!(aggregated, empty);
        assert_ne!(empty, Value::Number(0.0));
        assert_eq!(
            serde_json::to_string(&aggregated).unwrap(),
            r#"{"unavailable":"aggregated"}"#
        );
        assert_eq!(serde_json::to_string(&Value::Number(0.0)).unwrap(), "0.0");
    }

    #[test]
    fn mean_std_payload_serializes_flat() {
        let p = Payload::MeanStd {
            mean: Value::Number(1.5),
            std: Value::Number(0.5),
        };
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"mean":1.5,"std":0.5}"#
        );
    }

    #[test]
    fn table_rejects_ragged_rows() {
        let mut t = Table::new(["a", "b"]);
        assert!(t.push_row(vec![Cell::from(1.0)]).is_err());
        t.push_row(vec![Cell::from(1.0), Cell::Missing]).unwrap();
        assert_eq!(t.num_rows(), 1);
    }

    #[test]
    fn provenance_compares_identity_not_value() {
        let a = Arc::new(5u32);
        let b = Arc::new(5u32);
        let pa = Provenance::new(Arc::clone(&a));
        assert!(pa.same_source(&Provenance::new(a)));
        assert!(!pa.same_source(&Provenance::new(b)));
    }
}
