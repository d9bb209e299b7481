//! Buy-and-hold benchmark: the price path rescaled to the initial capital.

use serde::{Deserialize, Serialize};

use super::{pct_change, ValuePath};
use crate::error::{validate_prices, AnalysisError};

/// Normalized benchmark path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyHoldResult {
    values: Vec<f64>,
}

impl ValuePath for BuyHoldResult {
    fn portfolio_values(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn returns(&self) -> Vec<f64> {
        pct_change(&self.values)
    }
}

/// `value[t] = initial_capital × price[t] / price[0]`
pub fn simulate_buy_and_hold(
    prices: &[f64],
    initial_capital: f64,
) -> Result<BuyHoldResult, AnalysisError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(AnalysisError::invalid(format!(
            "initial capital must be > 0, got {initial_capital}"
        )));
    }
    validate_prices(prices)?;
    let base = prices[0];
    Ok(BuyHoldResult {
        values: prices.iter().map(|p| initial_capital * p / base).collect(),
    })
}
