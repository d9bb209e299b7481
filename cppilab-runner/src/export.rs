//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for analysis reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: comparison table, regime labels, per-regime statistics and the
//!   historical CPPI path for external tools
//! - **Markdown**: the headline comparison table
//!
//! The persisted report carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use cppilab_core::engine::SimulationResult;
use cppilab_core::regime::RegimeSeries;

use crate::bootstrap::ComparisonRow;
use crate::descriptive::{DescriptiveStats, RegimeStatistics};
use crate::runner::{AnalysisReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `AnalysisReport` to pretty JSON.
pub fn export_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

/// Deserialize an `AnalysisReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: market, cppi_avg_return, benchmark_avg_return, information_ratio
pub fn export_comparison_csv(rows: &[ComparisonRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "market",
        "cppi_avg_return",
        "benchmark_avg_return",
        "information_ratio",
    ])?;
    for r in rows {
        wtr.write_record([
            r.market.as_str(),
            &format!("{:.6}", r.cppi_avg_return),
            &format!("{:.6}", r.benchmark_avg_return),
            &format!("{:.6}", r.information_ratio),
        ])?;
    }
    finish(wtr)
}

/// One row per labelled date.
pub fn export_regimes_csv(regimes: &RegimeSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "rolling_return", "rolling_vol", "regime"])?;
    for (((date, ret), vol), label) in regimes
        .dates
        .iter()
        .zip(&regimes.rolling_return)
        .zip(&regimes.rolling_vol)
        .zip(&regimes.labels)
    {
        wtr.write_record([
            date.to_string().as_str(),
            &format!("{ret:.6}"),
            &format!("{vol:.6}"),
            label.display_name(),
        ])?;
    }
    finish(wtr)
}

/// Full sample first, then each regime. Missing test p-values are empty cells.
pub fn export_stats_csv(stats: &RegimeStatistics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "period",
        "annualized_mean",
        "annualized_std",
        "skewness",
        "kurtosis",
        "ljung_box_pvalue",
        "arch_pvalue",
        "observations",
    ])?;
    let rows = std::iter::once(("Full Sample", &stats.overall)).chain(
        stats
            .by_regime
            .iter()
            .map(|(label, s)| (label.display_name(), s)),
    );
    for (period, s) in rows {
        wtr.write_record(stats_record(period, s))?;
    }
    finish(wtr)
}

fn stats_record(period: &str, s: &DescriptiveStats) -> [String; 8] {
    let opt = |v: Option<f64>| v.map(|p| format!("{p:.6}")).unwrap_or_default();
    [
        period.to_string(),
        format!("{:.6}", s.annualized_mean),
        format!("{:.6}", s.annualized_std),
        format!("{:.6}", s.skewness),
        format!("{:.6}", s.excess_kurtosis),
        opt(s.ljung_box_pvalue),
        opt(s.arch_lm_pvalue),
        s.observations.to_string(),
    ]
}

/// Historical CPPI book, one row per date.
pub fn export_cppi_path_csv(dates: &[NaiveDate], path: &SimulationResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "portfolio_value",
        "risk_allocation",
        "safe_allocation",
        "floor_value",
        "cushion",
    ])?;
    for (date, s) in dates.iter().zip(path.states()) {
        wtr.write_record([
            &date.to_string(),
            &format!("{:.4}", s.portfolio_value),
            &format!("{:.4}", s.risk_allocation),
            &format!("{:.4}", s.safe_allocation),
            &format!("{:.4}", s.floor_value),
            &format!("{:.4}", s.cushion),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Headline comparison table, returns in percent.
pub fn render_comparison_markdown(rows: &[ComparisonRow]) -> String {
    let mut md = String::with_capacity(256);
    md.push_str("| Market | CPPI Avg Return | Benchmark Avg Return | Information Ratio |\n");
    md.push_str("| --- | ---: | ---: | ---: |\n");
    for r in rows {
        md.push_str(&format!(
            "| {} | {:.2}% | {:.2}% | {:.3} |\n",
            r.market,
            r.cppi_avg_return * 100.0,
            r.benchmark_avg_return * 100.0,
            r.information_ratio
        ));
    }
    md
}

/// Short run summary followed by the comparison table.
pub fn generate_report(report: &AnalysisReport) -> String {
    let mut md = String::with_capacity(1024);
    md.push_str("# CPPI vs Buy-and-Hold\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        report.start_date, report.end_date
    ));
    md.push_str(&format!("| Observations | {} |\n", report.observations));
    md.push_str(&format!(
        "| Simulations | {} per market |\n",
        report.config.bootstrap.n_simulations
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push_str("\n## Bootstrap Comparison\n\n");
    md.push_str(&render_comparison_markdown(&report.comparison));
    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for an analysis run.
///
/// Creates `run_{id}_{timestamp}/` under `output_dir` containing:
/// - `report.json`: the full `AnalysisReport`
/// - `report.md`: summary and comparison table
/// - `comparison.csv`
/// - `{market}_regimes.csv`, `{market}_stats.csv`, `{market}_cppi_path.csv`
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(12).collect();
    let dirname = format!(
        "run_{short_id}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir, "report.json", &export_json(report)?)?;
    write(&run_dir, "report.md", &generate_report(report))?;
    write(
        &run_dir,
        "comparison.csv",
        &export_comparison_csv(&report.comparison)?,
    )?;

    for m in &report.markets {
        write(
            &run_dir,
            &format!("{}_regimes.csv", m.market),
            &export_regimes_csv(&m.regimes)?,
        )?;
        write(
            &run_dir,
            &format!("{}_stats.csv", m.market),
            &export_stats_csv(&m.statistics)?,
        )?;
        write(
            &run_dir,
            &format!("{}_cppi_path.csv", m.market),
            &export_cppi_path_csv(&m.full_sample.dates, &m.full_sample.path)?,
        )?;
    }

    Ok(run_dir)
}

/// Load an `AnalysisReport` from an artifact directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
