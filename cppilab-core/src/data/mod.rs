//! Market data ingestion and business-day alignment

pub mod align;
pub mod csv_source;
pub mod provider;
pub mod synthetic;

pub use align::{build_panel, business_days, AlignOptions, TRADING_DAYS_PER_YEAR};
pub use csv_source::{read_wide_csv, write_wide_csv, CsvProvider, DEFAULT_RISK_FREE_COLUMN};
pub use provider::{DataError, DataSource, MarketDataProvider, RawPanel, RawRow};
pub use synthetic::{generate_synthetic_panel, SyntheticProvider};
