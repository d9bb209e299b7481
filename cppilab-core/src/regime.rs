//! Trailing-window regime classification.
//!
//! For each date `t >= window`:
//! - rolling return = `price[t] / price[t - window] - 1`
//! - rolling vol = sample std of the `window` daily returns ending at `t`
//! - trend = Bull if rolling return > 0, else Bear
//! - vol level = High if rolling vol > median(rolling vol), else Low
//!
//! The volatility median is taken once over every labelled date, so a label
//! at `t` depends on volatility observed after `t`. This look-ahead is kept
//! deliberately; it is the documented behaviour of the metric.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{RegimeLabel, Trend, VolLevel};
use crate::error::{validate_prices, AnalysisError};

/// Default trailing window (about half a trading year).
pub const DEFAULT_REGIME_WINDOW: usize = 126;

/// Regime classifier configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub window: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_REGIME_WINDOW,
        }
    }
}

/// One label per date from `offset` onward, plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSeries {
    /// Index into the input series of the first labelled date.
    pub offset: usize,
    pub dates: Vec<NaiveDate>,
    pub labels: Vec<RegimeLabel>,
    pub rolling_return: Vec<f64>,
    pub rolling_vol: Vec<f64>,
    /// Full-sample median of `rolling_vol`.
    pub vol_median: f64,
}

impl RegimeSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of the input index `i`, if it was classified.
    pub fn label_at(&self, i: usize) -> Option<RegimeLabel> {
        i.checked_sub(self.offset)
            .and_then(|j| self.labels.get(j))
            .copied()
    }

    /// Count of dates per regime, in `RegimeLabel::ALL` order.
    pub fn counts(&self) -> [(RegimeLabel, usize); 4] {
        RegimeLabel::ALL.map(|r| (r, self.labels.iter().filter(|&&l| l == r).count()))
    }
}

/// Relative band around the volatility median treated as a tie. Rolling std
/// of a constant return series is rounding noise, not zero.
const VOL_TIE_TOLERANCE: f64 = 1e-9;

/// Classify each date after the warm-up window.
///
/// `prices`, `returns` and `dates` are parallel; `returns[t]` is the return
/// into `dates[t]`.
pub fn classify_regimes(
    dates: &[NaiveDate],
    prices: &[f64],
    returns: &[f64],
    config: &RegimeConfig,
) -> Result<RegimeSeries, AnalysisError> {
    let window = config.window;
    if window < 2 {
        return Err(AnalysisError::invalid(format!(
            "regime window must be >= 2, got {window}"
        )));
    }
    if prices.len() != returns.len() || prices.len() != dates.len() {
        return Err(AnalysisError::invalid(format!(
            "regime inputs have mismatched lengths: {} dates, {} prices, {} returns",
            dates.len(),
            prices.len(),
            returns.len()
        )));
    }
    validate_prices(prices)?;
    if prices.len() <= window {
        return Err(AnalysisError::InsufficientData {
            required: window + 1,
            available: prices.len(),
        });
    }

    let rolling_return: Vec<f64> = (window..prices.len())
        .map(|t| prices[t] / prices[t - window] - 1.0)
        .collect();
    let rolling_vol: Vec<f64> = (window..prices.len())
        .map(|t| sample_std(&returns[t + 1 - window..=t]))
        .collect();

    let vol_median = median(&rolling_vol);
    let tie_band = VOL_TIE_TOLERANCE * vol_median.max(mean_abs(returns));

    let labels = rolling_return
        .iter()
        .zip(&rolling_vol)
        .map(|(&ret, &vol)| {
            let trend = if ret > 0.0 { Trend::Bull } else { Trend::Bear };
            // Within the tie band counts as Low, so flat volatility is one level.
            let level = if vol - vol_median > tie_band {
                VolLevel::High
            } else {
                VolLevel::Low
            };
            RegimeLabel::from_parts(trend, level)
        })
        .collect();

    Ok(RegimeSeries {
        offset: window,
        dates: dates[window..].to_vec(),
        labels,
        rolling_return,
        rolling_vol,
        vol_median,
    })
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
