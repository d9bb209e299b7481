//! Business-day alignment: raw provider rows into a gap-free `MarketPanel`.
//!
//! Steps:
//! 1. Reindex onto the Monday–Friday calendar spanning the raw rows
//! 2. Forward-fill every column
//! 3. Drop leading rows that still miss a price or the risk-free rate
//! 4. Convert the risk-free rate to a daily decimal (`pct / 100 / 252`)
//! 5. Compute log returns and drop the first row

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{info, warn};

use super::provider::{DataError, DataSource, RawPanel};
use crate::domain::{MarketPanel, MarketSeries, PriceSeries, ReturnKind};
use crate::error::AnalysisError;

/// Trading days per year used to de-annualize the risk-free rate.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Options for panel construction.
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Annual percentage used when the source has no risk-free column.
    pub risk_free_fallback_pct: f64,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            risk_free_fallback_pct: 2.0,
        }
    }
}

/// Align a raw panel onto business days and derive returns.
pub fn build_panel(raw: &RawPanel, opts: &AlignOptions) -> Result<MarketPanel, DataError> {
    let by_date: BTreeMap<NaiveDate, usize> = raw
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.date, i))
        .collect();

    let (first, last) = match (by_date.keys().next(), by_date.keys().next_back()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Err(DataError::Empty { start: None, end: None }),
    };

    if !raw.has_risk_free {
        warn!(
            fallback_pct = opts.risk_free_fallback_pct,
            "no risk-free column in source, using constant proxy"
        );
    }

    let n_markets = raw.markets.len();
    let mut last_prices: Vec<Option<f64>> = vec![None; n_markets];
    let mut last_rf: Option<f64> = if raw.has_risk_free {
        None
    } else {
        Some(opts.risk_free_fallback_pct)
    };

    let mut dates = Vec::new();
    let mut prices: Vec<Vec<f64>> = vec![Vec::new(); n_markets];
    let mut rf_pct = Vec::new();

    for day in business_days(first, last) {
        if let Some(&idx) = by_date.get(&day) {
            let row = &raw.rows[idx];
            for (slot, value) in last_prices.iter_mut().zip(&row.prices) {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    *slot = Some(v);
                }
            }
            if raw.has_risk_free {
                if let Some(r) = row.risk_free_pct.filter(|r| r.is_finite()) {
                    last_rf = Some(r);
                }
            }
        }

        // Leading rows that are still incomplete after forward-fill are dropped.
        let (Some(rf), true) = (last_rf, last_prices.iter().all(Option::is_some)) else {
            continue;
        };
        dates.push(day);
        rf_pct.push(rf);
        for (col, p) in prices.iter_mut().zip(&last_prices) {
            col.extend(*p);
        }
    }

    if dates.len() < 2 {
        return Err(DataError::Empty {
            start: Some(first),
            end: Some(last),
        });
    }

    for (name, col) in raw.markets.iter().zip(&prices) {
        if let Some(bad) = col.iter().find(|p| **p <= 0.0) {
            return Err(AnalysisError::invalid(format!(
                "market '{name}' has non-positive price {bad}"
            ))
            .into());
        }
    }

    // The first row only anchors the first return.
    let markets = raw
        .markets
        .iter()
        .zip(prices)
        .map(|(name, col)| {
            let series = PriceSeries::new(dates.clone(), col)?;
            let log_returns = series.returns(ReturnKind::Log);
            Ok(MarketSeries {
                name: name.clone(),
                prices: series.values()[1..].to_vec(),
                log_returns: log_returns.values().to_vec(),
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let panel = MarketPanel {
        dates: dates[1..].to_vec(),
        markets,
        risk_free_daily: rf_pct[1..]
            .iter()
            .map(|pct| pct / 100.0 / TRADING_DAYS_PER_YEAR)
            .collect(),
        synthetic: raw.source == DataSource::Synthetic,
    };
    panel.validate()?;

    info!(
        rows = panel.len(),
        first = %panel.dates[0],
        last = %panel.dates[panel.len() - 1],
        "market panel aligned"
    );
    Ok(panel)
}

/// Weekdays in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let span = (end - start).num_days().max(-1) + 1;
    (0..span)
        .map(move |offset| start + Duration::days(offset))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
