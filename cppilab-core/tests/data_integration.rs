//! Integration tests for the data pipeline: wide CSV → aligned panel → regimes → simulators.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, NaiveDate, Weekday};
use cppilab_core::data::{
    build_panel, generate_synthetic_panel, write_wide_csv, AlignOptions, CsvProvider, DataError,
    MarketDataProvider, SyntheticProvider,
};
use cppilab_core::engine::{simulate_buy_and_hold, simulate_cppi, CppiParams, ValuePath};
use cppilab_core::regime::{classify_regimes, RegimeConfig};
use cppilab_core::AnalysisError;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("cppilab_data_test_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn markets() -> Vec<String> {
    vec!["SP500".into(), "CSI300".into()]
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn csv_round_trip_builds_the_same_panel() {
    let dir = temp_dir();
    let path = dir.join("panel.csv");
    let raw = generate_synthetic_panel(&markets(), d(2022, 1, 1), d(2022, 12, 31));
    write_wide_csv(&raw, std::fs::File::create(&path).unwrap()).unwrap();

    let provider = CsvProvider::new(&path);
    assert_eq!(provider.name(), "csv");
    let imported = provider.fetch(&markets(), None, None).unwrap();
    let from_csv = build_panel(&imported, &AlignOptions::default()).unwrap();
    let direct = build_panel(&raw, &AlignOptions::default()).unwrap();

    assert_eq!(from_csv.dates, direct.dates);
    assert!(!from_csv.synthetic);
    assert!(direct.synthetic);
    for (a, b) in from_csv.risk_free_daily.iter().zip(&direct.risk_free_daily) {
        assert!((a - b).abs() < 1e-9);
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn panel_is_weekday_only_and_returns_are_log() {
    let raw = SyntheticProvider::new(d(2023, 1, 1), d(2023, 6, 30))
        .fetch(&markets(), None, None)
        .unwrap();
    let panel = build_panel(&raw, &AlignOptions::default()).unwrap();

    assert!(panel
        .dates
        .iter()
        .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    let sp = panel.market("SP500").unwrap();
    assert_eq!(sp.prices.len(), panel.len());
    assert_eq!(sp.log_returns.len(), panel.len());
    for i in 1..panel.len() {
        let expected = (sp.prices[i] / sp.prices[i - 1]).ln();
        assert!((sp.log_returns[i] - expected).abs() < 1e-12);
    }
}

#[test]
fn date_filter_applies_on_import() {
    let dir = temp_dir();
    let path = dir.join("panel.csv");
    let raw = generate_synthetic_panel(&markets(), d(2022, 1, 1), d(2022, 12, 31));
    write_wide_csv(&raw, std::fs::File::create(&path).unwrap()).unwrap();

    let imported = CsvProvider::new(&path)
        .fetch(&markets(), Some(d(2022, 3, 1)), Some(d(2022, 3, 31)))
        .unwrap();
    assert!(imported
        .rows
        .iter()
        .all(|r| r.date >= d(2022, 3, 1) && r.date <= d(2022, 3, 31)));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_market_column_reported() {
    let dir = temp_dir();
    let path = dir.join("panel.csv");
    std::fs::write(&path, "date,SP500\n2024-01-02,100\n").unwrap();
    let err = CsvProvider::new(&path)
        .fetch(&markets(), None, None)
        .unwrap_err();
    assert!(matches!(err, DataError::MissingColumn { column } if column == "CSI300"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn two_years_of_data_flow_through_regimes_and_simulators() {
    let raw = generate_synthetic_panel(&markets(), d(2020, 1, 1), d(2021, 12, 31));
    let panel = build_panel(&raw, &AlignOptions::default()).unwrap();
    let sp = panel.market("SP500").unwrap();

    let regimes = classify_regimes(
        &panel.dates,
        &sp.prices,
        &sp.log_returns,
        &RegimeConfig::default(),
    )
    .unwrap();
    assert_eq!(regimes.len(), panel.len() - 126);

    let cppi = simulate_cppi(&sp.prices, &panel.risk_free_daily, &CppiParams::default()).unwrap();
    let bh = simulate_buy_and_hold(&sp.prices, 100.0).unwrap();
    assert_eq!(cppi.len(), panel.len());
    assert_eq!(bh.returns().len(), panel.len() - 1);
    let terminal = cppi.terminal().unwrap();
    assert!(terminal.floor_value >= 95.0);
}

#[test]
fn short_history_is_insufficient_for_regimes() {
    let raw = generate_synthetic_panel(&markets(), d(2024, 1, 1), d(2024, 3, 31));
    let panel = build_panel(&raw, &AlignOptions::default()).unwrap();
    let sp = panel.market("SP500").unwrap();
    let err = classify_regimes(
        &panel.dates,
        &sp.prices,
        &sp.log_returns,
        &RegimeConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InsufficientData {
            required: 127,
            available: panel.len()
        }
    );
}
