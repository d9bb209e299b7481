use chrono::NaiveDate;
use cppilab_core::data::{build_panel, generate_synthetic_panel, AlignOptions};
use cppilab_runner::export::{
    export_json, import_json, load_artifacts, render_comparison_markdown, save_artifacts,
};
use cppilab_runner::{run_analysis_on_panel, AnalysisConfig, AnalysisReport, ComparisonRow};

fn small_report() -> AnalysisReport {
    let mut config = AnalysisConfig::default();
    config.regime.window = 60;
    config.bootstrap.n_simulations = 20;
    config.bootstrap.target_length = 120;

    let raw = generate_synthetic_panel(
        &config.markets,
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 6, 30).unwrap(),
    );
    let panel = build_panel(&raw, &AlignOptions::default()).unwrap();
    run_analysis_on_panel(&panel, "test-dataset", &config, None)
        .unwrap()
        .report
}

#[test]
fn test_save_artifacts_writes_every_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = small_report();

    let run_dir = save_artifacts(&report, temp_dir.path()).unwrap();
    for name in [
        "report.json",
        "report.md",
        "comparison.csv",
        "SP500_regimes.csv",
        "SP500_stats.csv",
        "SP500_cppi_path.csv",
        "CSI300_regimes.csv",
        "CSI300_stats.csv",
        "CSI300_cppi_path.csv",
    ] {
        assert!(run_dir.join(name).exists(), "missing {name}");
    }

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.markets.len(), 2);
    assert_eq!(loaded.comparison.len(), report.comparison.len());
    assert_eq!(loaded.config, report.config);
}

#[test]
fn test_csv_shapes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = small_report();
    let run_dir = save_artifacts(&report, temp_dir.path()).unwrap();

    let comparison = std::fs::read_to_string(run_dir.join("comparison.csv")).unwrap();
    let lines: Vec<&str> = comparison.lines().collect();
    assert_eq!(
        lines[0],
        "market,cppi_avg_return,benchmark_avg_return,information_ratio"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("SP500,"));

    let sp = report.market("SP500").unwrap();
    let path_csv = std::fs::read_to_string(run_dir.join("SP500_cppi_path.csv")).unwrap();
    assert_eq!(path_csv.lines().count(), sp.full_sample.path.len() + 1);

    let regimes_csv = std::fs::read_to_string(run_dir.join("SP500_regimes.csv")).unwrap();
    assert_eq!(regimes_csv.lines().count(), sp.regimes.len() + 1);

    // Full sample + four regimes
    let stats_csv = std::fs::read_to_string(run_dir.join("SP500_stats.csv")).unwrap();
    assert_eq!(stats_csv.lines().count(), 6);
    assert!(stats_csv.contains("Panic Bear"));
}

#[test]
fn test_json_rejects_newer_schema() {
    let report = small_report();
    let json = export_json(&report).unwrap();
    let bumped = json.replacen("\"schema_version\": 1", "\"schema_version\": 99", 1);
    let err = import_json(&bumped).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version 99"));
}

#[test]
fn test_json_without_schema_version_defaults() {
    let report = small_report();
    let json = export_json(&report).unwrap();
    let stripped = json.replacen("\"schema_version\": 1,", "", 1);
    let loaded = import_json(&stripped).unwrap();
    assert_eq!(loaded.schema_version, 1);
}

#[test]
fn test_markdown_table() {
    let rows = vec![ComparisonRow {
        market: "SP500".into(),
        cppi_avg_return: 0.0512,
        benchmark_avg_return: 0.0834,
        information_ratio: -0.4213,
    }];
    let md = render_comparison_markdown(&rows);
    assert!(md.starts_with("| Market | CPPI Avg Return |"));
    assert!(md.contains("| SP500 | 5.12% | 8.34% | -0.421 |"));
}
