//! Error bias: how feature values differ between rows the model under- or
//! over-estimates and the majority of rows.

use serde::Serialize;
use serde_json::json;

use mqr_core::artifact::{ArtifactDraft, ArtifactKind};
use mqr_core::dataset::{DataDefinition, Dataset, RegressionTask};
use mqr_core::fingerprint::{ParamValue, Params};
use mqr_core::result::Cell;

use crate::context::InputData;
use crate::unit::{ComputationUnit, RawResult, UnitOutput};
use crate::units::stats::{mean, mode, observations, quantile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Numerical,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBias {
    pub feature: String,
    pub feature_type: FeatureType,
    pub majority: Cell,
    pub under: Cell,
    pub over: Cell,
    /// Spread of the group means as a percentage of the feature range.
    pub range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasTable {
    /// Rows with a usable target and prediction.
    pub rows_used: usize,
    pub features: Vec<FeatureBias>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBiasResults {
    pub top_error: f64,
    pub current: BiasTable,
    pub reference: Option<BiasTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Majority,
    Under,
    Over,
}

/// `columns: None` analyses every feature column of the task.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBiasUnit {
    columns: Option<Vec<String>>,
    top_error: f64,
}

impl ErrorBiasUnit {
    /// Columns are treated as a set: sorted and de-duplicated.
    pub fn new(columns: Option<&[String]>, top_error: f64) -> Self {
        let columns = columns.map(|c| {
            let mut c = c.to_vec();
            c.sort();
            c.dedup();
            c
        });
        Self { columns, top_error }
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn top_error(&self) -> f64 {
        self.top_error
    }

    fn table(
        &self,
        data: &Dataset,
        task: &RegressionTask,
        definition: &DataDefinition,
    ) -> Result<BiasTable, String> {
        let features: Vec<String> = match &self.columns {
            Some(c) => c.clone(),
            None => definition
                .feature_columns(task, data)
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        if let Some(missing) = features.iter().find(|f| data.column(f).is_none()) {
            return Err(format!("feature column '{missing}' not found"));
        }

        let obs = observations(data, task)?;
        if obs.is_empty() {
            return Ok(BiasTable {
                rows_used: 0,
                features: Vec::new(),
            });
        }

        let mut sorted: Vec<f64> = obs.iter().map(|o| o.error()).collect();
        sorted.sort_by(f64::total_cmp);
        let low = quantile(&sorted, self.top_error).unwrap_or(f64::NEG_INFINITY);
        let high = quantile(&sorted, 1.0 - self.top_error).unwrap_or(f64::INFINITY);

        let grouped: Vec<(usize, Group)> = obs
            .iter()
            .map(|o| {
                let e = o.error();
                let g = if e <= low {
                    Group::Under
                } else if e >= high {
                    Group::Over
                } else {
                    Group::Majority
                };
                (o.row, g)
            })
            .collect();

        let mut rows = Vec::with_capacity(features.len());
        for name in features {
            let Some(column) = data.column(&name) else {
                continue;
            };
            let bias = if column.is_numeric() {
                numeric_bias(&name, &column.values, &grouped)
            } else {
                categorical_bias(&name, &column.values, &grouped)
            };
            rows.push(bias);
        }

        Ok(BiasTable {
            rows_used: obs.len(),
            features: rows,
        })
    }
}

fn numeric_bias(
    name: &str,
    values: &[mqr_core::dataset::Scalar],
    grouped: &[(usize, Group)],
) -> FeatureBias {
    let in_group = |g: Group| -> Vec<f64> {
        grouped
            .iter()
            .filter(|(_, gg)| *gg == g)
            .filter_map(|(row, _)| values[*row].as_f64())
            .collect()
    };
    let majority = mean(&in_group(Group::Majority));
    let under = mean(&in_group(Group::Under));
    let over = mean(&in_group(Group::Over));

    let used: Vec<f64> = grouped
        .iter()
        .filter_map(|(row, _)| values[*row].as_f64())
        .collect();
    let span = used.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - used.iter().copied().fold(f64::INFINITY, f64::min);

    let means: Vec<f64> = [majority, under, over].into_iter().flatten().collect();
    let range = if means.is_empty() {
        None
    } else if span > 0.0 {
        let hi = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = means.iter().copied().fold(f64::INFINITY, f64::min);
        Some((hi - lo) / span * 100.0)
    } else {
        Some(0.0)
    };

    FeatureBias {
        feature: name.to_string(),
        feature_type: FeatureType::Numerical,
        majority: Cell::from(majority),
        under: Cell::from(under),
        over: Cell::from(over),
        range,
    }
}

fn categorical_bias(
    name: &str,
    values: &[mqr_core::dataset::Scalar],
    grouped: &[(usize, Group)],
) -> FeatureBias {
    let group_mode = |g: Group| -> Cell {
        let labels: Vec<String> = grouped
            .iter()
            .filter(|(_, gg)| *gg == g)
            .filter(|(row, _)| !values[*row].is_null())
            .map(|(row, _)| values[*row].to_string())
            .collect();
        mode(labels.iter().map(String::as_str))
            .map(Cell::Text)
            .unwrap_or(Cell::Missing)
    };

    FeatureBias {
        feature: name.to_string(),
        feature_type: FeatureType::Categorical,
        majority: group_mode(Group::Majority),
        under: group_mode(Group::Under),
        over: group_mode(Group::Over),
        range: None,
    }
}

impl ComputationUnit for ErrorBiasUnit {
    type Output = ErrorBiasResults;

    const KIND: &'static str = "error_bias";

    fn params(&self) -> Params {
        Params::new()
            .with("columns", self.columns.as_ref().map(|c| ParamValue::set(c.iter())))
            .with("top_error", ParamValue::float(self.top_error))
    }

    fn compute(&self, input: &InputData<'_>) -> Result<UnitOutput<Self::Output>, String> {
        let current = self.table(input.current, input.task, input.definition)?;
        let reference = input
            .reference
            .map(|r| self.table(r, input.task, input.definition))
            .transpose()
            .map_err(|e| format!("reference: {e}"))?;

        let widget = ArtifactDraft::new(
            "Error Bias Table",
            ArtifactKind::Table,
            json!({
                "top_error": self.top_error,
                "current": current,
                "reference": reference,
            }),
        );

        Ok(UnitOutput {
            value: ErrorBiasResults {
                top_error: self.top_error,
                current,
                reference,
            },
            render: vec![widget],
        })
    }

    fn into_raw(output: Self::Output) -> RawResult {
        RawResult::ErrorBias(output)
    }

    fn from_raw(raw: &RawResult) -> Option<&Self::Output> {
        match raw {
            RawResult::ErrorBias(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqr_core::dataset::Column;

    fn data() -> Dataset {
        Dataset::new(vec![
            Column::from_f64("target", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
            Column::from_f64("prediction", &[1.0, 2.5, 0.0, 4.25, 4.5, 10.0, 7.0, 7.75]),
            Column::from_i64("age", &[25, 35, 45, 55, 65, 75, 85, 95]),
            Column::from_str_values("city", &["a", "a", "b", "b", "a", "c", "c", "a"]),
        ])
        .unwrap()
    }

    #[test]
    fn analyses_all_features_by_default() {
        let task = RegressionTask::new("target", "prediction");
        let unit = ErrorBiasUnit::new(None, 0.05);
        let table = unit.table(&data(), &task, &DataDefinition::new()).unwrap();
        assert_eq!(table.rows_used, 8);
        let names: Vec<&str> = table.features.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(names, vec!["age", "city"]);
        assert_eq!(table.features[0].feature_type, FeatureType::Numerical);
        assert!(table.features[0].range.is_some());
        assert_eq!(table.features[1].feature_type, FeatureType::Categorical);
        assert_eq!(table.features[1].range, None);
    }

    #[test]
    fn columns_of_other_tasks_are_skipped() {
        let task = RegressionTask::new("target", "prediction");
        let def = DataDefinition::new()
            .with_regression_task(task.clone())
            .with_regression_task(RegressionTask::new("age", "city").named("other"));
        let unit = ErrorBiasUnit::new(None, 0.05);
        let table = unit.table(&data(), &task, &def).unwrap();
        assert_eq!(table.rows_used, 8);
        assert!(table.features.is_empty());
    }

    #[test]
    fn extreme_errors_land_in_under_and_over() {
        let task = RegressionTask::new("target", "prediction");
        let unit = ErrorBiasUnit::new(Some(&["age".to_string()]), 0.05);
        let table = unit.table(&data(), &task, &DataDefinition::new()).unwrap();
        let age = &table.features[0];
        // Largest under-estimate is row 2 (age 45), largest over-estimate row 5 (age 75).
        assert_eq!(age.under, Cell::Number(45.0));
        assert_eq!(age.over, Cell::Number(75.0));
        assert_eq!(age.majority, Cell::Number(60.0));
    }

    #[test]
    fn unknown_feature_fails() {
        let task = RegressionTask::new("target", "prediction");
        let unit = ErrorBiasUnit::new(Some(&["height".to_string()]), 0.05);
        let err = unit.table(&data(), &task, &DataDefinition::new()).unwrap_err();
        assert!(err.contains("height"));
    }

    #[test]
    fn column_order_does_not_change_params() {
        let a = ErrorBiasUnit::new(Some(&["b".to_string(), "a".to_string()]), 0.1);
        let b = ErrorBiasUnit::new(Some(&["a".to_string(), "b".to_string(), "a".to_string()]), 0.1);
        assert_eq!(a.params(), b.params());
    }
}
