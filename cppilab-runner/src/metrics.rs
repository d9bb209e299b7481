//! Performance metrics: pure functions that compute return statistics.
//!
//! Every metric is a pure function: return series in, scalar out. Degenerate
//! inputs (empty series, zero variance, zero tracking error) fall back to 0.0.

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Summary statistics for one return series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Geometric annualized return: `(Π(1 + r))^(252 / n) - 1`.
    pub annualized_return: f64,
    /// Sample standard deviation × √252.
    pub annualized_volatility: f64,
    /// Percentage of periods with a negative return (0–100).
    pub pct_negative: f64,
    /// 5th percentile of returns, in percent.
    pub value_at_risk_5: f64,
    /// Bias-adjusted sample skewness.
    pub skewness: f64,
    /// Bias-adjusted sample excess kurtosis.
    pub kurtosis: f64,
    pub observations: usize,
}

impl MetricsRecord {
    /// Compute all metrics; an empty series yields the all-zero record.
    pub fn compute(returns: &[f64]) -> Self {
        if returns.is_empty() {
            return Self::default();
        }
        let negatives = returns.iter().filter(|&&r| r < 0.0).count();
        Self {
            annualized_return: annualized_return(returns),
            annualized_volatility: std_dev(returns) * TRADING_DAYS.sqrt(),
            pct_negative: negatives as f64 / returns.len() as f64 * 100.0,
            value_at_risk_5: percentile(returns, 5.0) * 100.0,
            skewness: sample_skewness(returns),
            kurtosis: sample_excess_kurtosis(returns),
            observations: returns.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compound the series and annualize over 252 periods per year.
///
/// A path that loses everything reports -1.0.
pub fn annualized_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS / returns.len() as f64) - 1.0
}

/// Information ratio of `strategy` over `benchmark`, aligned by position.
///
/// `mean(excess) × 252 / (std(excess) × √252)` over the shorter of the two
/// series. Returns 0.0 when there is no overlap or no tracking error.
pub fn information_ratio(strategy: &[f64], benchmark: &[f64]) -> f64 {
    let excess = excess_returns(strategy, benchmark);
    if excess.is_empty() {
        return 0.0;
    }
    let tracking = std_dev(&excess);
    if tracking < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) * TRADING_DAYS) / (tracking * TRADING_DAYS.sqrt())
}

/// `strategy[i] - benchmark[i]` truncated to the shorter series.
pub fn excess_returns(strategy: &[f64], benchmark: &[f64]) -> Vec<f64> {
    strategy
        .iter()
        .zip(benchmark)
        .map(|(s, b)| s - b)
        .collect()
}

/// Adjusted Fisher–Pearson skewness (G1). Needs at least 3 observations.
pub fn sample_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 < 1e-30 {
        return 0.0;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Adjusted excess kurtosis (G2). Needs at least 4 observations.
pub fn sample_excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 < 1e-30 {
        return 0.0;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Population skewness `m3 / m2^1.5`.
pub fn population_skewness(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 < 1e-30 {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Population excess kurtosis `m4 / m2² - 3`.
pub fn population_excess_kurtosis(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 < 1e-30 {
        return 0.0;
    }
    m4 / (m2 * m2) - 3.0
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Population central moments (m2, m3, m4).
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = mean_f64(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0.0 below two observations.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile (0–100) with linear interpolation between order statistics.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

/// Percentile of a sorted slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
