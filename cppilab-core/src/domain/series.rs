//! Dated price and return series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{validate_prices, AnalysisError};

/// How a return is derived from two consecutive prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// `p_t / p_{t-1} - 1`
    Simple,
    /// `ln(p_t / p_{t-1})`
    Log,
}

impl ReturnKind {
    pub fn compute(self, prev: f64, curr: f64) -> f64 {
        match self {
            ReturnKind::Simple => curr / prev - 1.0,
            ReturnKind::Log => (curr / prev).ln(),
        }
    }
}

/// Ordered `(date, price)` pairs with strictly increasing dates and positive prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PriceSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, AnalysisError> {
        if dates.len() != values.len() {
            return Err(AnalysisError::invalid(format!(
                "price series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        check_increasing(&dates)?;
        validate_prices(&values)?;
        Ok(Self { dates, values })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Period-over-period returns. One shorter than the price series; the
    /// return at position `i` is dated `dates[i + 1]`.
    pub fn returns(&self, kind: ReturnKind) -> ReturnSeries {
        let values = self
            .values
            .windows(2)
            .map(|w| kind.compute(w[0], w[1]))
            .collect();
        ReturnSeries {
            dates: self.dates.iter().skip(1).copied().collect(),
            values,
            kind,
        }
    }
}

/// Ordered `(date, return)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    kind: ReturnKind,
}

impl ReturnSeries {
    pub fn new(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        kind: ReturnKind,
    ) -> Result<Self, AnalysisError> {
        if dates.len() != values.len() {
            return Err(AnalysisError::invalid(format!(
                "return series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        check_increasing(&dates)?;
        if let Some(i) = values.iter().position(|r| !r.is_finite()) {
            return Err(AnalysisError::invalid(format!(
                "return at index {i} is not finite"
            )));
        }
        Ok(Self {
            dates,
            values,
            kind,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn check_increasing(dates: &[NaiveDate]) -> Result<(), AnalysisError> {
    if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
        return Err(AnalysisError::invalid(format!(
            "dates must be strictly increasing ({} followed by {})",
            dates[i],
            dates[i + 1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn returns_are_one_shorter_and_dated_forward() {
        let prices = PriceSeries::new(vec![d(2), d(3), d(4)], vec![100.0, 110.0, 99.0]).unwrap();
        let r = prices.returns(ReturnKind::Simple);
        assert_eq!(r.len(), 2);
        assert_eq!(r.dates(), &[d(3), d(4)]);
        assert!((r.values()[0] - 0.10).abs() < 1e-12);
        assert!((r.values()[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn log_returns() {
        let prices = PriceSeries::new(vec![d(2), d(3)], vec![100.0, 110.0]).unwrap();
        let r = prices.returns(ReturnKind::Log);
        assert!((r.values()[0] - 1.1_f64.ln()).abs() < 1e-12);
        assert_eq!(r.kind(), ReturnKind::Log);
    }

    #[test]
    fn duplicate_dates_rejected() {
        let err = PriceSeries::new(vec![d(2), d(2)], vec![100.0, 101.0]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn length_mismatch_rejected() {
        assert!(PriceSeries::new(vec![d(2)], vec![100.0, 101.0]).is_err());
        assert!(ReturnSeries::new(vec![d(2)], vec![], ReturnKind::Simple).is_err());
    }

    #[test]
    fn non_positive_price_rejected() {
        assert!(PriceSeries::new(vec![d(2), d(3)], vec![100.0, -1.0]).is_err());
    }
}
