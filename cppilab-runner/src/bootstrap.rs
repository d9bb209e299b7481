//! Block bootstrap of CPPI versus buy-and-hold.
//!
//! Each simulation:
//! 1. Draws `ceil(target / block)` fixed-length blocks of historical returns,
//!    each starting uniformly in `[0, len - block)`, concatenates them and
//!    truncates to `target` returns.
//! 2. Compounds the sample from 100 into a synthetic price path of
//!    `target + 1` points, so simulated return `i` is sampled return `i`.
//! 3. Runs CPPI on that path against a constant risk-free rate (the mean of
//!    the historical daily series) and compares it with the sampled returns.
//!
//! Simulations whose sample falls short of the target are dropped. If every
//! simulation of a market is dropped the aggregation reports
//! `EmptyResultSet`. Any other simulation error, such as a sampled return
//! of -1 or below compounding into a non-positive price, fails the whole
//! market with `InvalidInput`. Each simulation draws from its own `(market, index)`
//! sub-seed, so serial and parallel runs produce identical outcomes.

use cppilab_core::engine::{simulate_cppi, CppiParams, ValuePath};
use cppilab_core::rng::RngHierarchy;
use cppilab_core::AnalysisError;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::{information_ratio, mean_f64, percentile_sorted, MetricsRecord};

/// Starting level of every synthetic price path.
pub const SYNTHETIC_START_PRICE: f64 = 100.0;

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for the block bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Contiguous block length in trading days (default 20).
    pub block_size: usize,
    /// Returns per simulated path (default 252).
    pub target_length: usize,
    /// Simulations per market (default 1000).
    pub n_simulations: usize,
    /// Master seed for the per-simulation RNG hierarchy.
    pub seed: u64,
    /// Fan simulations out over the rayon pool.
    pub parallel: bool,
    /// Keep each simulation's sampled returns and CPPI returns in memory.
    pub keep_paths: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            block_size: 20,
            target_length: 252,
            n_simulations: 1000,
            seed: 42,
            parallel: true,
            keep_paths: false,
        }
    }
}

impl BootstrapConfig {
    /// Check the settings against a source series of `source_len` returns.
    pub fn validate(&self, source_len: usize) -> Result<(), AnalysisError> {
        validate_sampling(source_len, self.block_size, self.target_length)?;
        if self.n_simulations == 0 {
            return Err(AnalysisError::invalid("n_simulations must be > 0"));
        }
        Ok(())
    }
}

fn validate_sampling(
    source_len: usize,
    block_size: usize,
    target_length: usize,
) -> Result<(), AnalysisError> {
    if block_size == 0 {
        return Err(AnalysisError::invalid("block_size must be > 0"));
    }
    if target_length == 0 {
        return Err(AnalysisError::invalid("target_length must be > 0"));
    }
    if block_size >= source_len {
        return Err(AnalysisError::invalid(format!(
            "block_size {block_size} must be smaller than the source series ({source_len} returns)"
        )));
    }
    Ok(())
}

// ─── Sampling ────────────────────────────────────────────────────────

/// One resampled return series and the block starts that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSample {
    pub returns: Vec<f64>,
    pub block_starts: Vec<usize>,
}

impl BootstrapSample {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Compound the sample into a price path of `len + 1` points.
    pub fn price_path(&self, start: f64) -> Vec<f64> {
        let mut path = Vec::with_capacity(self.returns.len() + 1);
        path.push(start);
        let mut level = start;
        for r in &self.returns {
            level *= 1.0 + r;
            path.push(level);
        }
        path
    }
}

/// Draw one fixed-length block bootstrap sample.
///
/// Every block is a contiguous slice of `returns` starting in
/// `[0, len - block_size)`.
pub fn block_bootstrap_sample<R: Rng + ?Sized>(
    returns: &[f64],
    block_size: usize,
    target_length: usize,
    rng: &mut R,
) -> Result<BootstrapSample, AnalysisError> {
    validate_sampling(returns.len(), block_size, target_length)?;

    let n_blocks = target_length.div_ceil(block_size);
    let max_start = returns.len() - block_size;
    let mut sampled = Vec::with_capacity(n_blocks * block_size);
    let mut block_starts = Vec::with_capacity(n_blocks);

    for _ in 0..n_blocks {
        let start = rng.gen_range(0..max_start);
        block_starts.push(start);
        sampled.extend_from_slice(&returns[start..start + block_size]);
    }
    sampled.truncate(target_length);

    Ok(BootstrapSample {
        returns: sampled,
        block_starts,
    })
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Metrics of one kept simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub index: usize,
    pub cppi: MetricsRecord,
    pub benchmark: MetricsRecord,
    pub information_ratio: f64,
    /// Present only when `keep_paths` is set.
    pub sample: Option<BootstrapSample>,
    /// Present only when `keep_paths` is set.
    pub cppi_returns: Option<Vec<f64>>,
}

/// All simulations for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapRun {
    pub market: String,
    pub requested: usize,
    /// Kept simulations in index order.
    pub outcomes: Vec<SimulationOutcome>,
    pub dropped: usize,
}

/// Run a single simulation against a pre-seeded RNG.
pub fn run_simulation<R: Rng + ?Sized>(
    index: usize,
    returns: &[f64],
    mean_risk_free: f64,
    params: &CppiParams,
    config: &BootstrapConfig,
    rng: &mut R,
) -> Result<SimulationOutcome, AnalysisError> {
    let sample = block_bootstrap_sample(returns, config.block_size, config.target_length, rng)?;
    if sample.len() < config.target_length {
        return Err(AnalysisError::InsufficientData {
            required: config.target_length,
            available: sample.len(),
        });
    }

    let prices = sample.price_path(SYNTHETIC_START_PRICE);
    let risk_free = vec![mean_risk_free; prices.len()];
    let cppi_returns = simulate_cppi(&prices, &risk_free, params)?.returns();

    let outcome = SimulationOutcome {
        index,
        cppi: MetricsRecord::compute(&cppi_returns),
        benchmark: MetricsRecord::compute(&sample.returns),
        information_ratio: information_ratio(&cppi_returns, &sample.returns),
        sample: None,
        cppi_returns: None,
    };
    if config.keep_paths {
        return Ok(SimulationOutcome {
            sample: Some(sample),
            cppi_returns: Some(cppi_returns),
            ..outcome
        });
    }
    Ok(outcome)
}

/// Run every simulation for one market.
///
/// Configuration errors surface immediately. A simulation failing with
/// `InsufficientData` is dropped; any other error aborts the market, e.g. a
/// sample that compounds to a non-positive price fails CPPI input checks.
pub fn run_market_bootstrap(
    market: &str,
    returns: &[f64],
    mean_risk_free: f64,
    params: &CppiParams,
    config: &BootstrapConfig,
    rngs: &RngHierarchy,
) -> Result<BootstrapRun, AnalysisError> {
    config.validate(returns.len())?;
    params.validate()?;

    let simulate = |i: usize| {
        let mut rng = rngs.rng_for(market, i as u64);
        run_simulation(i, returns, mean_risk_free, params, config, &mut rng)
    };

    let results: Vec<Result<SimulationOutcome, AnalysisError>> = if config.parallel {
        (0..config.n_simulations).into_par_iter().map(simulate).collect()
    } else {
        (0..config.n_simulations).map(simulate).collect()
    };

    let mut outcomes = Vec::with_capacity(results.len());
    let mut dropped = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(AnalysisError::InsufficientData {
                required,
                available,
            }) => {
                debug!(market, simulation = i, required, available, "simulation dropped");
                dropped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        market,
        kept = outcomes.len(),
        dropped,
        "bootstrap complete"
    );

    Ok(BootstrapRun {
        market: market.to_string(),
        requested: config.n_simulations,
        outcomes,
        dropped,
    })
}

// ─── Aggregation ─────────────────────────────────────────────────────

/// 5th / 50th / 95th percentiles of a simulated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentileBand {
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

impl PercentileBand {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Self {
            p5: percentile_sorted(&sorted, 5.0),
            p50: percentile_sorted(&sorted, 50.0),
            p95: percentile_sorted(&sorted, 95.0),
        }
    }
}

/// Headline comparison for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub market: String,
    /// Mean CPPI annualized return across kept simulations.
    pub cppi_avg_return: f64,
    /// Mean buy-and-hold annualized return across kept simulations.
    pub benchmark_avg_return: f64,
    /// Mean information ratio across kept simulations.
    pub information_ratio: f64,
}

/// Aggregated bootstrap statistics for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBootstrapSummary {
    pub market: String,
    pub requested: usize,
    pub kept: usize,
    pub dropped: usize,
    pub cppi_avg_return: f64,
    pub benchmark_avg_return: f64,
    pub information_ratio: f64,
    pub cppi_avg_volatility: f64,
    pub benchmark_avg_volatility: f64,
    pub cppi_return_band: PercentileBand,
    pub information_ratio_band: PercentileBand,
}

impl MarketBootstrapSummary {
    pub fn comparison_row(&self) -> ComparisonRow {
        ComparisonRow {
            market: self.market.clone(),
            cppi_avg_return: self.cppi_avg_return,
            benchmark_avg_return: self.benchmark_avg_return,
            information_ratio: self.information_ratio,
        }
    }
}

/// Average the kept simulations of one market.
pub fn summarize(run: &BootstrapRun) -> Result<MarketBootstrapSummary, AnalysisError> {
    if run.outcomes.is_empty() {
        return Err(AnalysisError::EmptyResultSet {
            market: run.market.clone(),
        });
    }

    let collect = |f: fn(&SimulationOutcome) -> f64| -> Vec<f64> {
        run.outcomes.iter().map(f).collect()
    };
    let cppi_returns = collect(|o| o.cppi.annualized_return);
    let irs = collect(|o| o.information_ratio);

    Ok(MarketBootstrapSummary {
        market: run.market.clone(),
        requested: run.requested,
        kept: run.outcomes.len(),
        dropped: run.dropped,
        cppi_avg_return: mean_f64(&cppi_returns),
        benchmark_avg_return: mean_f64(&collect(|o| o.benchmark.annualized_return)),
        information_ratio: mean_f64(&irs),
        cppi_avg_volatility: mean_f64(&collect(|o| o.cppi.annualized_volatility)),
        benchmark_avg_volatility: mean_f64(&collect(|o| o.benchmark.annualized_volatility)),
        cppi_return_band: PercentileBand::from_values(&cppi_returns),
        information_ratio_band: PercentileBand::from_values(&irs),
    })
}

/// One comparison row per market, in input order.
pub fn comprehensive_metrics(runs: &[BootstrapRun]) -> Result<Vec<ComparisonRow>, AnalysisError> {
    runs.iter()
        .map(|run| summarize(run).map(|s| s.comparison_row()))
        .collect()
}
