//! Fingerprint canonicalization across the metric/unit boundary.

use mqr_core::config::ReportConfig;
use mqr_core::fingerprint::{fingerprint, ParamValue, Params};
use mqr_metrics::regression::{
    MeanError, RegressionErrorBiasDetails, RegressionErrorBiasTable, RegressionErrorDistribution,
};
use mqr_metrics::Metric;

fn fp_of(metric: impl Into<Metric>) -> mqr_core::fingerprint::Fingerprint {
    metric
        .into()
        .validate(&ReportConfig::default())
        .expect("valid metric")
}

#[test]
fn column_order_and_duplicates_do_not_matter() {
    let a = fp_of(RegressionErrorBiasTable::new().with_columns(["age", "city"]));
    let b = fp_of(RegressionErrorBiasDetails::new().with_columns(["city", "age", "city"]));
    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn any_parameter_change_changes_identity() {
    let base = fp_of(RegressionErrorBiasTable::new().with_columns(["age"]));
    assert_ne!(base, fp_of(RegressionErrorBiasTable::new().with_columns(["city"])));
    assert_ne!(
        base,
        fp_of(RegressionErrorBiasTable::new().with_columns(["age"]).with_top_error(0.1))
    );
    assert_ne!(base, fp_of(RegressionErrorBiasTable::new()));
    assert_ne!(
        base,
        fp_of(RegressionErrorBiasTable::new().with_columns(["age"]).for_task("other"))
    );
}

#[test]
fn empty_column_set_is_not_absent() {
    let all = fp_of(RegressionErrorBiasTable::new());
    let none = fp_of(RegressionErrorBiasTable::new().with_columns(Vec::<String>::new()));
    assert_ne!(all, none);
}

#[test]
fn configured_defaults_are_resolved_before_hashing() {
    let cfg = ReportConfig::default();
    let implicit = fp_of(RegressionErrorDistribution::new());
    let explicit = fp_of(RegressionErrorDistribution::new().with_bins(cfg.histogram_bins));
    assert_eq!(implicit, explicit);

    let tuned = Metric::from(RegressionErrorDistribution::new())
        .validate(&ReportConfig {
            histogram_bins: 7,
            ..ReportConfig::default()
        })
        .unwrap();
    assert_ne!(implicit, tuned);
}

#[test]
fn unit_kind_separates_identical_params() {
    let a = fingerprint("regression_quality", Params::new(), None);
    let b = fingerprint("error_bias", Params::new(), None);
    assert_ne!(a, b);
    assert_eq!(a, fp_of(MeanError::new()));
}

#[test]
fn float_params_compare_by_canonical_bits() {
    let nan_a = fingerprint("u", Params::new().with("x", ParamValue::float(f64::NAN)), None);
    let nan_b = fingerprint("u", Params::new().with("x", ParamValue::float(-f64::NAN)), None);
    assert_eq!(nan_a, nan_b);

    let zero = fingerprint("u", Params::new().with("x", ParamValue::float(0.0)), None);
    let neg_zero = fingerprint("u", Params::new().with("x", ParamValue::float(-0.0)), None);
    assert_ne!(zero, neg_zero);
}

#[test]
fn list_order_is_significant_but_set_order_is_not() {
    let l1 = fingerprint("u", Params::new().with("v", ParamValue::list(["a", "b"])), None);
    let l2 = fingerprint("u", Params::new().with("v", ParamValue::list(["b", "a"])), None);
    assert_ne!(l1, l2);

    let s1 = fingerprint("u", Params::new().with("v", ParamValue::set(["a", "b"])), None);
    let s2 = fingerprint("u", Params::new().with("v", ParamValue::set(["b", "a"])), None);
    assert_eq!(s1, s2);
}
