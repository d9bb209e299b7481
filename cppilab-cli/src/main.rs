//! CPPILab CLI: regime analysis and CPPI bootstrap commands.
//!
//! Commands:
//! - `analyze`: run the full pipeline on a CSV panel (or synthetic data) and save artifacts
//! - `synthetic`: write a synthetic panel CSV in the import format

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cppilab_core::data::{generate_synthetic_panel, write_wide_csv};
use cppilab_runner::export::{render_comparison_markdown, save_artifacts};
use cppilab_runner::{
    run_analysis, AnalysisConfig, AnalysisProgress, AnalysisReport, LoadOptions, Stage,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "cppilab",
    about = "CPPILab CLI: CPPI vs buy-and-hold across market regimes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify regimes, describe returns, and bootstrap CPPI against buy-and-hold.
    Analyze {
        /// Wide CSV: date, one close column per market, optional risk_free_pct.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Use synthetic data when no CSV is given.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Override the number of bootstrap simulations per market.
        #[arg(long)]
        simulations: Option<usize>,

        /// Override the bootstrap master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Run simulations on one thread.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Write a synthetic panel CSV.
    Synthetic {
        /// Destination CSV file.
        #[arg(long)]
        output: PathBuf,

        /// Markets to generate.
        #[arg(long, num_args = 1.., default_values_t = ["SP500".to_string(), "CSI300".to_string()])]
        markets: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2015-01-01")]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-11-01")]
        end: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            data,
            synthetic,
            config,
            output_dir,
            simulations,
            seed,
            serial,
        } => run_analyze_cmd(
            data,
            synthetic,
            config,
            output_dir,
            simulations,
            seed,
            serial,
        ),
        Commands::Synthetic {
            output,
            markets,
            start,
            end,
        } => run_synthetic_cmd(output, markets, &start, &end),
    }
}

/// Progress observer that logs through `tracing`.
struct TracingProgress;

impl AnalysisProgress for TracingProgress {
    fn on_market_start(&self, market: &str, index: usize, total: usize) {
        info!(market, "[{}/{}] analyzing", index + 1, total);
    }

    fn on_stage_complete(&self, market: &str, stage: Stage) {
        tracing::debug!(market, ?stage, "stage complete");
    }

    fn on_bootstrap_complete(&self, market: &str, kept: usize, dropped: usize) {
        info!(market, kept, dropped, "simulations aggregated");
    }
}

fn run_analyze_cmd(
    data: Option<PathBuf>,
    synthetic: bool,
    config_path: Option<PathBuf>,
    output_dir: PathBuf,
    simulations: Option<usize>,
    seed: Option<u64>,
    serial: bool,
) -> Result<()> {
    if data.is_none() && !synthetic {
        bail!("one of --data or --synthetic is required");
    }

    let mut config = match config_path {
        Some(path) => AnalysisConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(n) = simulations {
        config.bootstrap.n_simulations = n;
    }
    if let Some(s) = seed {
        config.bootstrap.seed = s;
    }
    if serial {
        config.bootstrap.parallel = false;
    }

    let opts = LoadOptions {
        data_path: data,
        synthetic,
    };
    let outcome = run_analysis(&config, &opts, Some(&TracingProgress))?;

    print_summary(&outcome.report);

    let run_dir = save_artifacts(&outcome.report, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_synthetic_cmd(output: PathBuf, markets: Vec<String>, start: &str, end: &str) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        bail!("--start {start} is after --end {end}");
    }

    let panel = generate_synthetic_panel(&markets, start, end);
    let file = std::fs::File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_wide_csv(&panel, file)?;

    println!(
        "Wrote {} rows for {} to {}",
        panel.rows.len(),
        markets.join(", "),
        output.display()
    );
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn print_summary(report: &AnalysisReport) {
    println!();
    println!("=== CPPI vs Buy-and-Hold ===");
    println!(
        "Period:       {} to {} ({} days)",
        report.start_date, report.end_date, report.observations
    );
    println!("Dataset hash: {}", &report.dataset_hash);
    if report.synthetic {
        println!("Data:         SYNTHETIC");
    }

    for m in &report.markets {
        println!();
        println!("--- {} ---", m.market);
        for (label, count) in m.regimes.counts() {
            println!("  {:<14} {count:>6} days", label.display_name());
        }
        let fs = &m.full_sample;
        println!(
            "  Full sample: CPPI {:.2}%  B&H {:.2}%  IR {:.3}  floored {:.1}%",
            fs.cppi.annualized_return * 100.0,
            fs.benchmark.annualized_return * 100.0,
            fs.information_ratio,
            fs.floored_fraction * 100.0
        );
        let b = &m.bootstrap;
        println!(
            "  Bootstrap:   {} kept / {} dropped, CPPI return P5 {:.2}%  P50 {:.2}%  P95 {:.2}%",
            b.kept,
            b.dropped,
            b.cppi_return_band.p5 * 100.0,
            b.cppi_return_band.p50 * 100.0,
            b.cppi_return_band.p95 * 100.0
        );
    }

    println!();
    print!("{}", render_comparison_markdown(&report.comparison));
}
