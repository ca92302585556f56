//! Report definition parsing and the CSV -> report -> JSON path the CLI drives.

use mqr_core::config::ReportConfig;
use mqr_exec::{apply_report_config, parse_yaml_report, ExecError, Report};
use mqr_io::{CsvReader, SnapshotWriter};

const CURRENT_CSV: &str = "\
price,predicted_price,age,city
1,1,25,a
2,2.5,35,a
3,0,45,b
4,4.25,55,b
5,4.5,65,a
6,10,75,c
7,7,85,c
8,7.75,95,a
";

const REPORT_YAML: &str = r#"
config:
  max_parallel_tasks: 2
  scatter_max_points: 4
tasks:
  - name: prices
    target: price
    prediction: predicted_price
metrics:
  - type: RegressionErrorBiasTable
    regression_name: prices
    columns: [age]
  - type: RegressionErrorBiasDetails
    regression_name: prices
    columns: [age]
  - type: MAE
    regression_name: prices
    label: headline
  - type: RegressionPredictedVsActualScatter
    regression_name: prices
"#;

#[test]
fn test_parse_full_report() {
    let parsed = parse_yaml_report(REPORT_YAML).unwrap();
    assert_eq!(parsed.metrics.len(), 4);
    assert_eq!(parsed.metrics[2].kind(), "MAE");
    assert_eq!(parsed.metrics[2].label(), Some("headline"));
    assert!(parsed.definition.resolve("prices").is_some());
    assert!(parsed.definition.resolve("default").is_none());
    assert_eq!(parsed.config.max_parallel_tasks, Some(2));
}

#[test]
fn test_unknown_metric_kind_is_rejected() {
    let yaml = "metrics:\n  - type: R2Score\n";
    assert!(matches!(
        parse_yaml_report(yaml),
        Err(ExecError::Definition(_))
    ));
}

#[test]
fn test_unknown_top_level_key_is_rejected() {
    let yaml = "metrics: []\nsteps: []\n";
    assert!(parse_yaml_report(yaml).is_err());
}

#[test]
fn test_unknown_metric_parameter_is_rejected() {
    for yaml in [
        "metrics:\n  - { type: RegressionErrorBiasTable, top_eror: 0.3 }\n",
        "metrics:\n  - { type: MAE, bins: 5 }\n",
    ] {
        assert!(
            matches!(parse_yaml_report(yaml), Err(ExecError::Definition(_))),
            "{yaml}"
        );
    }
}

#[test]
fn test_validate_reports_bad_parameters() {
    let yaml = r#"
metrics:
  - type: RegressionErrorDistribution
    bins: 0
  - type: MeanError
"#;
    let parsed = parse_yaml_report(yaml).unwrap();
    let report = Report::new(parsed.metrics);
    let checked = report.validate();
    assert!(checked[0].1.is_err());
    assert!(checked[1].1.is_ok());
}

#[test]
fn test_csv_report_to_json() {
    let parsed = parse_yaml_report(REPORT_YAML).unwrap();
    let mut config = ReportConfig::default();
    apply_report_config(&mut config, &parsed.config);

    let current = CsvReader::from_reader(CURRENT_CSV.as_bytes())
        .read_dataset()
        .unwrap();
    let snapshot = Report::new(parsed.metrics)
        .with_config(config)
        .run(current, None, parsed.definition)
        .unwrap();
    assert!(snapshot.manifest.is_clean());
    assert_eq!(snapshot.manifest.cache.executions, 3);

    let mut buf = Vec::new();
    SnapshotWriter::to_writer(&mut buf).write(&snapshot).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries[0]["id"], "RegressionErrorBiasTable");
    assert_eq!(entries[0]["outcome"]["current"], 1.0);
    assert_eq!(entries[2]["id"], "MAE[headline]");
    assert!(entries[2]["outcome"]["current"]["mean"].is_number());
    assert_eq!(
        entries[3]["outcome"]["current"],
        serde_json::json!({ "unavailable": "aggregated" })
    );
    assert!(entries[0]["outcome"]["reference"].is_null());

    // error_bias table, regression_quality counter, MAE counter, scatter.
    assert_eq!(json["artifacts"].as_array().unwrap().len(), 4);
    assert!(!json["manifest"]["results_hash"].is_null());
    assert_eq!(json["manifest"]["succeeded"].as_array().unwrap().len(), 4);
}
