//! Built-in computation units.
//!
//! Each unit computes over the current dataset and, when present, the
//! reference dataset independently. Rows whose target or prediction is not
//! numeric are skipped.

pub mod error_bias;
pub mod error_distribution;
pub mod predicted_vs_actual;
pub mod regression_quality;
pub mod stats;

pub use error_bias::ErrorBiasUnit;
pub use error_distribution::ErrorDistributionUnit;
pub use predicted_vs_actual::PredictedVsActualUnit;
pub use regression_quality::RegressionQualityUnit;
