//! Small numeric helpers shared by the units.

use mqr_core::dataset::{Dataset, RegressionTask};

/// One usable regression row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub row: usize,
    pub target: f64,
    pub prediction: f64,
}

impl Observation {
    pub fn error(&self) -> f64 {
        self.prediction - self.target
    }
}

/// Rows where both target and prediction are numeric.
pub fn observations(data: &Dataset, task: &RegressionTask) -> Result<Vec<Observation>, String> {
    let target = data
        .numeric(&task.target)
        .ok_or_else(|| format!("target column '{}' not found", task.target))?;
    let prediction = data
        .numeric(&task.prediction)
        .ok_or_else(|| format!("prediction column '{}' not found", task.prediction))?;

    Ok(target
        .into_iter()
        .zip(prediction)
        .enumerate()
        .filter_map(|(row, pair)| match pair {
            (Some(target), Some(prediction)) => Some(Observation {
                row,
                target,
                prediction,
            }),
            _ => None,
        })
        .collect())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `0.0` for a single value.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated quantile of an ascending slice, `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Most frequent value; ties resolve to the lexicographically smallest.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (v, c) in counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((v, c));
        }
    }
    best.map(|(v, _)| v.to_string())
}
