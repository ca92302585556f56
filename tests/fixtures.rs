//! Shared datasets for integration tests.
#![allow(dead_code)]

use mqr_core::dataset::{Column, DataDefinition, Dataset, RegressionTask};

/// Eight rows; errors (prediction - target) are 0, 0.5, -3, 0.25, -0.5, 4, 0, -0.25.
pub fn current() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("target", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        Column::from_f64("prediction", &[1.0, 2.5, 0.0, 4.25, 4.5, 10.0, 7.0, 7.75]),
        Column::from_i64("age", &[25, 35, 45, 55, 65, 75, 85, 95]),
        Column::from_str_values("city", &["a", "a", "b", "b", "a", "c", "c", "a"]),
    ])
    .expect("valid fixture")
}

pub fn reference() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("target", &[2.0, 4.0, 6.0, 8.0]),
        Column::from_f64("prediction", &[2.5, 3.0, 6.0, 9.0]),
        Column::from_i64("age", &[30, 40, 50, 60]),
        Column::from_str_values("city", &["a", "b", "b", "c"]),
    ])
    .expect("valid fixture")
}

pub fn empty() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("target", &[]),
        Column::from_f64("prediction", &[]),
        Column::from_i64("age", &[]),
    ])
    .expect("valid fixture")
}

pub fn definition() -> DataDefinition {
    DataDefinition::new().with_regression_task(RegressionTask::new("target", "prediction"))
}

/// Adds a `broken` task whose target column does not exist.
pub fn definition_with_broken_task() -> DataDefinition {
    definition().with_regression_task(RegressionTask::new("missing", "prediction").named("broken"))
}
