//! Lightweight in-memory dataset model and the regression task registry.
//!
//! Datasets are read-only for the whole report run; calculations and
//! computation units only ever borrow them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fingerprint::DEFAULT_TASK;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl Scalar {
    /// Numeric view; `None` for nulls, booleans, and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I64(i) => Some(*i as f64),
            Scalar::F64(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::I64(_) | Scalar::F64(_))
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, ""),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::I64(i) => write!(f, "{i}"),
            Scalar::F64(x) => write!(f, "{x}"),
            Scalar::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().map(|v| Scalar::F64(*v)).collect())
    }

    pub fn from_i64(name: impl Into<String>, values: &[i64]) -> Self {
        Self::new(name, values.iter().map(|v| Scalar::I64(*v)).collect())
    }

    pub fn from_str_values(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            values.iter().map(|v| Scalar::Str((*v).to_string())).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A column is numeric when every non-null value is numeric (and at least one exists).
    pub fn is_numeric(&self) -> bool {
        let mut seen = false;
        for v in &self.values {
            if v.is_null() {
                continue;
            }
            if !v.is_numeric() {
                return false;
            }
            seen = true;
        }
        seen
    }
}

/// Columns are equal-length and uniquely named; every constructor, including
/// deserialization, goes through [`Dataset::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    columns: Vec<Column>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = crate::error::Error;

    fn try_from(raw: RawDataset) -> crate::error::Result<Self> {
        Dataset::new(raw.columns)
    }
}

impl Dataset {
    /// Build a dataset, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> crate::error::Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            for c in &columns {
                if c.len() != rows {
                    return Err(crate::error::Error::Config(format!(
                        "column '{}' has {} rows, expected {}",
                        c.name,
                        c.len(),
                        rows
                    )));
                }
            }
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|o| o.name == c.name) {
                return Err(crate::error::Error::Config(format!(
                    "duplicate column '{}'",
                    c.name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Numeric view of a column; non-numeric cells become `None`.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|c| c.values.iter().map(Scalar::as_f64).collect())
    }
}

/// A regression task: which columns hold the ground truth and the prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionTask {
    #[serde(default = "default_task_name")]
    pub name: String,
    pub target: String,
    pub prediction: String,
}

fn default_task_name() -> String {
    DEFAULT_TASK.to_string()
}

impl RegressionTask {
    pub fn new(target: impl Into<String>, prediction: impl Into<String>) -> Self {
        Self {
            name: default_task_name(),
            target: target.into(),
            prediction: prediction.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every dataset column that is neither the target nor the prediction.
    pub fn feature_columns<'a>(&'a self, data: &'a Dataset) -> Vec<&'a str> {
        data.column_names()
            .filter(|n| *n != self.target && *n != self.prediction)
            .collect()
    }
}

/// Registry translating task names into the columns they concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDefinition {
    tasks: BTreeMap<String, RegressionTask>,
}

impl DataDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_regression_task(&mut self, task: RegressionTask) {
        self.tasks.insert(task.name.clone(), task);
    }

    pub fn with_regression_task(mut self, task: RegressionTask) -> Self {
        self.add_regression_task(task);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&RegressionTask> {
        self.tasks.get(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Feature columns for `task`: its own target and prediction are excluded,
    /// and so are the target and prediction of every registered task.
    pub fn feature_columns<'a>(
        &'a self,
        task: &'a RegressionTask,
        data: &'a Dataset,
    ) -> Vec<&'a str> {
        task.feature_columns(data)
            .into_iter()
            .filter(|n| {
                !self
                    .tasks
                    .values()
                    .any(|t| t.target == *n || t.prediction == *n)
            })
            .collect()
    }
}
