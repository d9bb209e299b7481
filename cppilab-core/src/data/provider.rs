//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (CSV import,
//! synthetic generation) so the analysis pipeline never knows where the
//! panel came from and tests can inject fixed panels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AnalysisError;

/// One calendar row as delivered by a provider, before alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: NaiveDate,
    /// Close price per market, in the order of `RawPanel::markets`.
    pub prices: Vec<Option<f64>>,
    /// Annualized risk-free rate in percent (e.g. 4.5 for 4.5%).
    pub risk_free_pct: Option<f64>,
}

/// Unaligned provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPanel {
    pub markets: Vec<String>,
    pub rows: Vec<RawRow>,
    /// False when the source carries no risk-free column at all.
    pub has_risk_free: bool,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CsvImport,
    Synthetic,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found in input")]
    MissingColumn { column: String },

    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("no usable rows between {start:?} and {end:?}")]
    Empty {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Trait for market data providers.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes for `markets` plus the risk-free rate.
    ///
    /// `start` / `end` are inclusive bounds; `None` means unbounded.
    fn fetch(
        &self,
        markets: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RawPanel, DataError>;
}
