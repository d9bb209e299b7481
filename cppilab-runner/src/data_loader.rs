//! Panel loading and data resolution for the runner.
//!
//! Resolves where the price panel comes from:
//! 1. If a CSV path is given → import it
//! 2. If no path and `synthetic` is set → generate a synthetic panel (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! The raw provider output is then aligned onto business days and hashed.

use std::path::PathBuf;

use chrono::NaiveDate;
use cppilab_core::data::{
    build_panel, CsvProvider, DataError, DataSource, MarketDataProvider, SyntheticProvider,
};
use cppilab_core::domain::MarketPanel;
use thiserror::Error;
use tracing::info;

use crate::config::AnalysisConfig;

/// Default synthetic window when the config leaves the dates open.
pub const DEFAULT_SYNTHETIC_START: (i32, u32, u32) = (2015, 1, 1);
pub const DEFAULT_SYNTHETIC_END: (i32, u32, u32) = (2024, 11, 1);

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data source: pass a CSV file or enable --synthetic")]
    NoDataSource,

    #[error("invalid synthetic date range")]
    InvalidRange,

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling where the panel comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Wide CSV to import.
    pub data_path: Option<PathBuf>,
    /// Generate synthetic data when no CSV is given.
    pub synthetic: bool,
}

/// Aligned panel plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub panel: MarketPanel,
    pub source: DataSource,
    /// BLAKE3 over dates, prices and risk-free rates.
    pub dataset_hash: String,
}

/// Resolve a provider from the options and load the configured markets.
pub fn load_panel(config: &AnalysisConfig, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let provider: Box<dyn MarketDataProvider> = match (&opts.data_path, opts.synthetic) {
        (Some(path), _) => Box::new(
            CsvProvider::new(path).with_risk_free_column(config.data.risk_free_column.clone()),
        ),
        (None, true) => {
            let start = config.data.start.unwrap_or(ymd(DEFAULT_SYNTHETIC_START)?);
            let end = config.data.end.unwrap_or(ymd(DEFAULT_SYNTHETIC_END)?);
            Box::new(SyntheticProvider::new(start, end))
        }
        (None, false) => return Err(LoadError::NoDataSource),
    };
    load_from_provider(provider.as_ref(), config)
}

/// Fetch from any provider and align onto business days.
pub fn load_from_provider(
    provider: &dyn MarketDataProvider,
    config: &AnalysisConfig,
) -> Result<LoadedData, LoadError> {
    let raw = provider.fetch(&config.markets, config.data.start, config.data.end)?;
    let source = raw.source;
    let panel = build_panel(&raw, &config.data.align_options())?;
    let dataset_hash = compute_dataset_hash(&panel);

    info!(
        provider = provider.name(),
        markets = panel.markets.len(),
        rows = panel.len(),
        dataset = &dataset_hash[..12],
        "panel loaded"
    );

    Ok(LoadedData {
        panel,
        source,
        dataset_hash,
    })
}

/// Deterministic BLAKE3 hash over the aligned panel, in market order.
pub fn compute_dataset_hash(panel: &MarketPanel) -> String {
    let mut hasher = blake3::Hasher::new();
    for date in &panel.dates {
        hasher.update(date.to_string().as_bytes());
    }
    for market in &panel.markets {
        hasher.update(market.name.as_bytes());
        for p in &market.prices {
            hasher.update(&p.to_le_bytes());
        }
    }
    for rf in &panel.risk_free_daily {
        hasher.update(&rf.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn ymd((y, m, d): (i32, u32, u32)) -> Result<NaiveDate, LoadError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(LoadError::InvalidRange)
}
