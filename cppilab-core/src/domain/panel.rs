//! Aligned multi-market panel on a business-day calendar.
//!
//! Every column has the same length as `dates`. `log_returns[i]` is the
//! return into `dates[i]`, so the first row already carries a return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::series::{PriceSeries, ReturnKind, ReturnSeries};
use crate::error::{validate_prices, AnalysisError};

/// Close prices and log returns for a single market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSeries {
    pub name: String,
    pub prices: Vec<f64>,
    pub log_returns: Vec<f64>,
}

/// Gap-free panel of index prices and the daily risk-free rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPanel {
    pub dates: Vec<NaiveDate>,
    pub markets: Vec<MarketSeries>,
    /// Per-period risk-free rate (annual percentage / 100 / 252).
    pub risk_free_daily: Vec<f64>,
    /// True when any column was generated rather than observed.
    pub synthetic: bool,
}

impl MarketPanel {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn market_names(&self) -> Vec<&str> {
        self.markets.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn market(&self, name: &str) -> Option<&MarketSeries> {
        self.markets.iter().find(|m| m.name == name)
    }

    fn require(&self, name: &str) -> Result<&MarketSeries, AnalysisError> {
        self.market(name)
            .ok_or_else(|| AnalysisError::invalid(format!("market '{name}' not in panel")))
    }

    pub fn price_series(&self, name: &str) -> Result<PriceSeries, AnalysisError> {
        let m = self.require(name)?;
        PriceSeries::new(self.dates.clone(), m.prices.clone())
    }

    pub fn return_series(&self, name: &str) -> Result<ReturnSeries, AnalysisError> {
        let m = self.require(name)?;
        ReturnSeries::new(self.dates.clone(), m.log_returns.clone(), ReturnKind::Log)
    }

    /// Mean of the daily risk-free column; 0.0 for an empty panel.
    pub fn mean_risk_free(&self) -> f64 {
        if self.risk_free_daily.is_empty() {
            return 0.0;
        }
        self.risk_free_daily.iter().sum::<f64>() / self.risk_free_daily.len() as f64
    }

    /// Check the column-length and positivity invariants.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let n = self.dates.len();
        if self.risk_free_daily.len() != n {
            return Err(AnalysisError::invalid(format!(
                "risk-free column has {} rows, expected {n}",
                self.risk_free_daily.len()
            )));
        }
        if self.risk_free_daily.iter().any(|r| !r.is_finite()) {
            return Err(AnalysisError::invalid("risk-free column has undefined values"));
        }
        for m in &self.markets {
            if m.prices.len() != n || m.log_returns.len() != n {
                return Err(AnalysisError::invalid(format!(
                    "market '{}' has {} prices / {} returns, expected {n}",
                    m.name,
                    m.prices.len(),
                    m.log_returns.len()
                )));
            }
            validate_prices(&m.prices)?;
        }
        Ok(())
    }
}
