//! Synthetic panel generation for offline development.
//!
//! Produces a deterministic random walk per market (seeded from the market
//! name) plus a slowly drifting risk-free rate. Results computed on this data
//! are tagged synthetic.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::provider::{DataError, DataSource, MarketDataProvider, RawPanel, RawRow};

/// Synthetic provider covering a fixed date range.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        markets: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RawPanel, DataError> {
        let start = start.unwrap_or(self.start).max(self.start);
        let end = end.unwrap_or(self.end).min(self.end);
        warn!(
            markets = markets.len(),
            %start,
            %end,
            "generating synthetic market data; results will be tagged as synthetic"
        );
        Ok(generate_synthetic_panel(markets, start, end))
    }
}

/// Generate a weekday-only synthetic panel.
pub fn generate_synthetic_panel(markets: &[String], start: NaiveDate, end: NaiveDate) -> RawPanel {
    let mut walks: Vec<(StdRng, f64)> = markets
        .iter()
        .map(|m| {
            let seed: [u8; 32] = *blake3::hash(m.as_bytes()).as_bytes();
            (StdRng::from_seed(seed), 100.0_f64)
        })
        .collect();
    let mut rf_rng = StdRng::from_seed(*blake3::hash(b"risk_free").as_bytes());
    let mut rf_pct = 2.0_f64;

    let mut rows = Vec::new();
    let mut current = start;
    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let prices = walks
            .iter_mut()
            .map(|(rng, price)| {
                let daily_return: f64 = rng.gen_range(-0.02..0.0205);
                *price *= 1.0 + daily_return;
                Some(*price)
            })
            .collect();

        rf_pct = (rf_pct + rf_rng.gen_range(-0.02..0.02)).clamp(0.0, 8.0);

        rows.push(RawRow {
            date: current,
            prices,
            risk_free_pct: Some(rf_pct),
        });
        current += Duration::days(1);
    }

    RawPanel {
        markets: markets.to_vec(),
        rows,
        has_risk_free: true,
        source: DataSource::Synthetic,
    }
}
