//! CPPILab Runner: analysis orchestration, metrics, block bootstrap, reporting.
//!
//! This crate builds on `cppilab-core` to provide:
//! - Data loading with CSV import / synthetic fallback and dataset hashing
//! - Return metrics and the information ratio
//! - Descriptive statistics per market regime (moments, Ljung–Box, ARCH-LM)
//! - Fixed-block bootstrap of CPPI versus buy-and-hold, serial or rayon-parallel
//! - TOML configuration with content-hash run ids
//! - JSON / CSV / Markdown artifact export

pub mod bootstrap;
pub mod config;
pub mod data_loader;
pub mod descriptive;
pub mod export;
pub mod metrics;
pub mod runner;

pub use bootstrap::{
    block_bootstrap_sample, comprehensive_metrics, run_market_bootstrap, summarize,
    BootstrapConfig, BootstrapRun, BootstrapSample, ComparisonRow, MarketBootstrapSummary,
    PercentileBand, SimulationOutcome,
};
pub use config::{AnalysisConfig, ConfigError, DataConfig};
pub use data_loader::{load_panel, LoadError, LoadOptions, LoadedData};
pub use descriptive::{describe, describe_by_regime, DescriptiveStats, RegimeStatistics};
pub use metrics::{information_ratio, MetricsRecord};
pub use runner::{
    run_analysis, run_analysis_on_panel, AnalysisOutcome, AnalysisProgress, AnalysisReport,
    MarketReport, RunError, Stage, SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn metrics_record_is_send_sync() {
        assert_send::<MetricsRecord>();
        assert_sync::<MetricsRecord>();
    }

    #[test]
    fn bootstrap_types_are_send_sync() {
        assert_send::<BootstrapConfig>();
        assert_sync::<BootstrapConfig>();
        assert_send::<SimulationOutcome>();
        assert_sync::<SimulationOutcome>();
        assert_send::<BootstrapRun>();
        assert_sync::<BootstrapRun>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<AnalysisReport>();
        assert_sync::<AnalysisReport>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }
}
