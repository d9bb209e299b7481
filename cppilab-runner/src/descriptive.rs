//! Descriptive statistics of daily returns, overall and per regime.
//!
//! Moments are population (biased) estimates. Two dependence tests are
//! reported as p-values:
//! - Ljung–Box on the returns at lag 10 (serial correlation)
//! - Engle's ARCH-LM on squared returns (volatility clustering)
//!
//! A statistic that cannot be computed for a subset (too few observations,
//! zero variance, singular regression) is `None` rather than an error.

use cppilab_core::domain::RegimeLabel;
use cppilab_core::regime::RegimeSeries;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::metrics::{
    mean_f64, population_excess_kurtosis, population_skewness, std_dev, TRADING_DAYS,
};

/// Lag used by the Ljung–Box test.
pub const LJUNG_BOX_LAG: usize = 10;
/// Upper bound on the ARCH-LM lag count.
pub const ARCH_MAX_LAGS: usize = 10;

/// Statistics of one return subset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub observations: usize,
    pub annualized_mean: f64,
    pub annualized_std: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub ljung_box_pvalue: Option<f64>,
    pub arch_lm_pvalue: Option<f64>,
}

/// Full-sample and per-regime statistics for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStatistics {
    /// Over every labelled date.
    pub overall: DescriptiveStats,
    /// One entry per regime in `RegimeLabel::ALL` order, including empty ones.
    pub by_regime: Vec<(RegimeLabel, DescriptiveStats)>,
}

impl RegimeStatistics {
    pub fn get(&self, label: RegimeLabel) -> Option<&DescriptiveStats> {
        self.by_regime
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, s)| s)
    }
}

/// Describe a return series.
pub fn describe(returns: &[f64]) -> DescriptiveStats {
    if returns.is_empty() {
        return DescriptiveStats::default();
    }
    DescriptiveStats {
        observations: returns.len(),
        annualized_mean: mean_f64(returns) * TRADING_DAYS,
        annualized_std: std_dev(returns) * TRADING_DAYS.sqrt(),
        skewness: population_skewness(returns),
        excess_kurtosis: population_excess_kurtosis(returns),
        ljung_box_pvalue: ljung_box_pvalue(returns, LJUNG_BOX_LAG),
        arch_lm_pvalue: arch_lm_pvalue(returns, ARCH_MAX_LAGS.min(returns.len() / 5)),
    }
}

/// Group `returns` by the regime of each index and describe every group.
///
/// `returns` must be parallel to the series `regimes` was classified from;
/// unlabelled warm-up indices are ignored.
pub fn describe_by_regime(returns: &[f64], regimes: &RegimeSeries) -> RegimeStatistics {
    let mut groups: [Vec<f64>; 4] = Default::default();
    let mut overall = Vec::with_capacity(regimes.len());

    for (i, &r) in returns.iter().enumerate() {
        let Some(label) = regimes.label_at(i) else {
            continue;
        };
        overall.push(r);
        if let Some(slot) = RegimeLabel::ALL.iter().position(|l| *l == label) {
            groups[slot].push(r);
        }
    }

    RegimeStatistics {
        overall: describe(&overall),
        by_regime: RegimeLabel::ALL
            .iter()
            .zip(groups.iter())
            .map(|(label, g)| (*label, describe(g)))
            .collect(),
    }
}

// ─── Tests of dependence ─────────────────────────────────────────────

/// Ljung–Box Q at `lags`, as an upper-tail χ²(`lags`) p-value.
pub fn ljung_box_pvalue(values: &[f64], lags: usize) -> Option<f64> {
    let n = values.len();
    if lags == 0 || n <= lags {
        return None;
    }
    let mean = mean_f64(values);
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let denom: f64 = centered.iter().map(|d| d * d).sum();
    if denom < 1e-30 {
        return None;
    }

    let nf = n as f64;
    let q = (1..=lags)
        .map(|k| {
            let rho = centered[k..]
                .iter()
                .zip(&centered[..n - k])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denom;
            rho * rho / (nf - k as f64)
        })
        .sum::<f64>()
        * nf
        * (nf + 2.0);

    chi_squared_sf(q, lags)
}

/// Engle's ARCH-LM test with `lags` lags.
///
/// Regresses `x_t²` on a constant and `x_{t-1}², …, x_{t-lags}²`; the
/// statistic `(n - lags) · R²` is compared against χ²(`lags`).
pub fn arch_lm_pvalue(values: &[f64], lags: usize) -> Option<f64> {
    if lags == 0 || values.len() <= 2 * lags + 1 {
        return None;
    }
    let sq: Vec<f64> = values.iter().map(|v| v * v).collect();
    let rows = sq.len() - lags;
    let cols = lags + 1;

    let y: Vec<f64> = sq[lags..].to_vec();
    let design: Vec<Vec<f64>> = (lags..sq.len())
        .map(|t| {
            let mut row = Vec::with_capacity(cols);
            row.push(1.0);
            row.extend((1..=lags).map(|k| sq[t - k]));
            row
        })
        .collect();

    let beta = ols(&design, &y)?;
    let y_mean = mean_f64(&y);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if sst < 1e-30 {
        return None;
    }
    let ssr: f64 = design
        .iter()
        .zip(&y)
        .map(|(row, v)| {
            let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
            (v - fitted).powi(2)
        })
        .sum();
    let r_squared = (1.0 - ssr / sst).clamp(0.0, 1.0);

    chi_squared_sf(rows as f64 * r_squared, lags)
}

fn chi_squared_sf(stat: f64, df: usize) -> Option<f64> {
    if !stat.is_finite() {
        return None;
    }
    let dist = ChiSquared::new(df as f64).ok()?;
    Some(dist.sf(stat.max(0.0)))
}

/// Least squares via the normal equations; `None` if `XᵀX` is singular.
fn ols(design: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let k = design.first()?.len();
    // Augmented [XᵀX | Xᵀy]
    let mut a = vec![vec![0.0; k + 1]; k];
    for (row, &yi) in design.iter().zip(y) {
        for i in 0..k {
            for j in 0..k {
                a[i][j] += row[i] * row[j];
            }
            a[i][k] += row[i] * yi;
        }
    }

    for col in 0..k {
        let pivot = (col..k).max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        for r in col + 1..k {
            let factor = a[r][col] / a[col][col];
            for c in col..=k {
                a[r][c] -= factor * a[col][c];
            }
        }
    }

    let mut beta = vec![0.0; k];
    for i in (0..k).rev() {
        let tail: f64 = (i + 1..k).map(|j| a[i][j] * beta[j]).sum();
        beta[i] = (a[i][k] - tail) / a[i][i];
    }
    beta.iter().all(|b| b.is_finite()).then_some(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cppilab_core::regime::{classify_regimes, RegimeConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-0.01..0.01)).collect()
    }

    #[test]
    fn white_noise_is_not_autocorrelated() {
        let p = ljung_box_pvalue(&noise(1000, 1), 10).unwrap();
        assert!(p > 0.01, "p = {p}");
    }

    #[test]
    fn persistent_series_is_autocorrelated() {
        let r: Vec<f64> = (0..500).map(|i| ((i / 25) % 2) as f64 * 0.01 - 0.005).collect();
        let p = ljung_box_pvalue(&r, 10).unwrap();
        assert!(p < 1e-6, "p = {p}");
    }

    #[test]
    fn ljung_box_needs_more_than_lag_points() {
        assert!(ljung_box_pvalue(&[0.1; 10], 10).is_none());
        assert!(ljung_box_pvalue(&[0.01; 50], 10).is_none());
    }

    #[test]
    fn volatility_clusters_trip_arch_test() {
        let base = noise(600, 2);
        let r: Vec<f64> = base
            .iter()
            .enumerate()
            .map(|(i, x)| if (i / 50) % 2 == 0 { x * 0.1 } else { x * 5.0 })
            .collect();
        let p = arch_lm_pvalue(&r, 10).unwrap();
        assert!(p < 0.01, "p = {p}");
    }

    #[test]
    fn arch_test_on_noise_is_a_probability() {
        let p = arch_lm_pvalue(&noise(600, 3), 10).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn arch_test_short_series_is_none() {
        assert!(arch_lm_pvalue(&noise(15, 4), 10).is_none());
        assert!(arch_lm_pvalue(&noise(100, 4), 0).is_none());
    }

    #[test]
    fn ols_recovers_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 2.0 + 3.0 * i as f64).collect();
        let beta = ols(&design, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-9);
        assert!((beta[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn ols_singular_is_none() {
        let design: Vec<Vec<f64>> = (0..5).map(|_| vec![1.0, 1.0]).collect();
        assert!(ols(&design, &[1.0; 5]).is_none());
    }

    #[test]
    fn describe_annualizes() {
        let r = vec![0.001, 0.003, 0.001, 0.003];
        let s = describe(&r);
        assert_eq!(s.observations, 4);
        assert!((s.annualized_mean - 0.002 * 252.0).abs() < 1e-12);
        assert!(s.skewness.abs() < 1e-12);
    }

    #[test]
    fn describe_by_regime_partitions_labelled_dates() {
        let n = 400;
        let d0 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..n).map(|i| d0 + chrono::Days::new(i as u64)).collect();
        let returns = noise(n, 9);
        let mut prices = Vec::with_capacity(n);
        let mut level = 100.0;
        for r in &returns {
            level *= 1.0 + r;
            prices.push(level);
        }
        let regimes =
            classify_regimes(&dates, &prices, &returns, &RegimeConfig { window: 50 }).unwrap();
        let stats = describe_by_regime(&returns, &regimes);

        assert_eq!(stats.overall.observations, n - 50);
        let total: usize = stats.by_regime.iter().map(|(_, s)| s.observations).sum();
        assert_eq!(total, n - 50);
        assert_eq!(stats.by_regime.len(), 4);
        assert!(stats.get(RegimeLabel::PanicBear).is_some());
    }
}
