//! Domain types for CPPILab

pub mod panel;
pub mod regime;
pub mod series;

pub use panel::{MarketPanel, MarketSeries};
pub use regime::{RegimeLabel, Trend, VolLevel};
pub use series::{PriceSeries, ReturnKind, ReturnSeries};
