//! Analysis runner: wires together data, regimes, statistics, simulators and the bootstrap.
//!
//! Two entry points:
//! - `run_analysis()`: loads the panel from the configured source, then runs. Used by the CLI.
//! - `run_analysis_on_panel()`: takes a pre-loaded panel. No I/O.
//!
//! Per market:
//! 1. Classify regimes over the trailing window
//! 2. Describe returns overall and per regime
//! 3. Run CPPI and buy-and-hold on the historical path
//! 4. Block-bootstrap CPPI against buy-and-hold and aggregate

use chrono::NaiveDate;
use cppilab_core::domain::MarketPanel;
use cppilab_core::engine::{
    simulate_buy_and_hold, simulate_cppi, CppiState, SimulationResult, ValuePath,
};
use cppilab_core::regime::{classify_regimes, RegimeSeries};
use cppilab_core::rng::RngHierarchy;
use cppilab_core::AnalysisError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::bootstrap::{
    run_market_bootstrap, summarize, BootstrapRun, ComparisonRow, MarketBootstrapSummary,
};
use crate::config::{AnalysisConfig, ConfigError};
use crate::data_loader::{load_panel, LoadError, LoadOptions};
use crate::descriptive::{describe_by_regime, RegimeStatistics};
use crate::metrics::{information_ratio, MetricsRecord};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("market '{market}': {source}")]
    Analysis {
        market: String,
        source: AnalysisError,
    },
    #[error("market '{0}' not found in loaded data")]
    MarketNotFound(String),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Progress ────────────────────────────────────────────────────────

/// Pipeline stage reported to an `AnalysisProgress` observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Regimes,
    Statistics,
    FullSample,
    Bootstrap,
}

/// Observer for long-running analyses. All methods default to no-ops.
pub trait AnalysisProgress: Send + Sync {
    fn on_market_start(&self, _market: &str, _index: usize, _total: usize) {}
    fn on_stage_complete(&self, _market: &str, _stage: Stage) {}
    fn on_bootstrap_complete(&self, _market: &str, _kept: usize, _dropped: usize) {}
}

// ─── Result types ────────────────────────────────────────────────────

/// CPPI and buy-and-hold on the historical path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullSampleAnalysis {
    /// Panel dates, parallel to `path`.
    pub dates: Vec<NaiveDate>,
    pub cppi: MetricsRecord,
    pub benchmark: MetricsRecord,
    pub information_ratio: f64,
    pub terminal: Option<CppiState>,
    /// Fraction of days with the cushion exhausted.
    pub floored_fraction: f64,
    pub path: SimulationResult,
}

/// Everything computed for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub market: String,
    pub regimes: RegimeSeries,
    pub statistics: RegimeStatistics,
    pub full_sample: FullSampleAnalysis,
    pub bootstrap: MarketBootstrapSummary,
}

/// Complete, persisted result of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: usize,
    pub config: AnalysisConfig,
    pub markets: Vec<MarketReport>,
    pub comparison: Vec<ComparisonRow>,
}

impl AnalysisReport {
    pub fn market(&self, name: &str) -> Option<&MarketReport> {
        self.markets.iter().find(|m| m.market == name)
    }
}

/// Report plus the per-simulation bootstrap outcomes behind it.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub runs: Vec<BootstrapRun>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ─── Entry points ────────────────────────────────────────────────────

/// Validate the config, load the panel and run the analysis.
pub fn run_analysis(
    config: &AnalysisConfig,
    opts: &LoadOptions,
    progress: Option<&dyn AnalysisProgress>,
) -> Result<AnalysisOutcome, RunError> {
    let loaded = load_panel(config, opts)?;
    run_analysis_on_panel(&loaded.panel, &loaded.dataset_hash, config, progress)
}

/// Run the analysis on a pre-loaded panel: no I/O.
pub fn run_analysis_on_panel(
    panel: &MarketPanel,
    dataset_hash: &str,
    config: &AnalysisConfig,
    progress: Option<&dyn AnalysisProgress>,
) -> Result<AnalysisOutcome, RunError> {
    config.validate().map_err(ConfigError::from)?;
    let run_id = config.run_id()?;
    let (start_date, end_date) = match (panel.dates.first(), panel.dates.last()) {
        (Some(&s), Some(&e)) => (s, e),
        _ => {
            return Err(RunError::Analysis {
                market: config.markets.join(","),
                source: AnalysisError::InsufficientData {
                    required: 2,
                    available: 0,
                },
            })
        }
    };

    let rngs = RngHierarchy::new(config.bootstrap.seed);
    let total = config.markets.len();
    let mut markets = Vec::with_capacity(total);
    let mut runs = Vec::with_capacity(total);

    for (i, name) in config.markets.iter().enumerate() {
        if let Some(p) = progress {
            p.on_market_start(name, i, total);
        }
        let (report, run) = analyze_market(panel, name, config, &rngs, progress)?;
        markets.push(report);
        runs.push(run);
    }

    let comparison = markets.iter().map(|m| m.bootstrap.comparison_row()).collect();

    info!(
        run_id = &run_id[..12],
        markets = markets.len(),
        synthetic = panel.synthetic,
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        report: AnalysisReport {
            schema_version: SCHEMA_VERSION,
            run_id,
            dataset_hash: dataset_hash.to_string(),
            synthetic: panel.synthetic,
            start_date,
            end_date,
            observations: panel.len(),
            config: config.clone(),
            markets,
            comparison,
        },
        runs,
    })
}

/// All four stages for one market of the panel.
pub fn analyze_market(
    panel: &MarketPanel,
    name: &str,
    config: &AnalysisConfig,
    rngs: &RngHierarchy,
    progress: Option<&dyn AnalysisProgress>,
) -> Result<(MarketReport, BootstrapRun), RunError> {
    if panel.market(name).is_none() {
        return Err(RunError::MarketNotFound(name.to_string()));
    }
    let fail = |source: AnalysisError| RunError::Analysis {
        market: name.to_string(),
        source,
    };
    let prices = panel.price_series(name).map_err(fail)?;
    let returns = panel.return_series(name).map_err(fail)?;
    let stage_done = |stage: Stage| {
        if let Some(p) = progress {
            p.on_stage_complete(name, stage);
        }
    };

    // ─── Regimes ───
    let regimes = classify_regimes(prices.dates(), prices.values(), returns.values(), &config.regime)
        .map_err(fail)?;
    let [(_, stable_bull), (_, volatile_bull), (_, stable_bear), (_, panic_bear)] =
        regimes.counts();
    info!(
        market = name,
        labelled = regimes.len(),
        stable_bull,
        volatile_bull,
        stable_bear,
        panic_bear,
        "regimes classified"
    );
    stage_done(Stage::Regimes);

    // ─── Statistics ───
    let statistics = describe_by_regime(returns.values(), &regimes);
    stage_done(Stage::Statistics);

    // ─── Full sample ───
    let full_sample =
        full_sample_analysis(prices.dates(), prices.values(), &panel.risk_free_daily, config)
            .map_err(fail)?;
    info!(
        market = name,
        cppi_return = full_sample.cppi.annualized_return,
        benchmark_return = full_sample.benchmark.annualized_return,
        floored = full_sample.floored_fraction,
        "full-sample simulation complete"
    );
    stage_done(Stage::FullSample);

    // ─── Bootstrap ───
    let run = run_market_bootstrap(
        name,
        returns.values(),
        panel.mean_risk_free(),
        &config.cppi,
        &config.bootstrap,
        rngs,
    )
    .map_err(fail)?;
    if let Some(p) = progress {
        p.on_bootstrap_complete(name, run.outcomes.len(), run.dropped);
    }
    let bootstrap = summarize(&run).map_err(fail)?;
    stage_done(Stage::Bootstrap);

    Ok((
        MarketReport {
            market: name.to_string(),
            regimes,
            statistics,
            full_sample,
            bootstrap,
        },
        run,
    ))
}

/// CPPI against the historical risk-free series, compared with buy-and-hold.
pub fn full_sample_analysis(
    dates: &[NaiveDate],
    prices: &[f64],
    risk_free: &[f64],
    config: &AnalysisConfig,
) -> Result<FullSampleAnalysis, AnalysisError> {
    let path = simulate_cppi(prices, risk_free, &config.cppi)?;
    let benchmark = simulate_buy_and_hold(prices, config.cppi.initial_capital)?;

    let cppi_returns = path.returns();
    let benchmark_returns = benchmark.returns();

    Ok(FullSampleAnalysis {
        dates: dates.to_vec(),
        cppi: MetricsRecord::compute(&cppi_returns),
        benchmark: MetricsRecord::compute(&benchmark_returns),
        information_ratio: information_ratio(&cppi_returns, &benchmark_returns),
        terminal: path.terminal().copied(),
        floored_fraction: path.floored_fraction(),
        path,
    })
}
