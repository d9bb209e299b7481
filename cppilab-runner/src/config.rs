//! Serializable analysis configuration.
//!
//! Loaded from TOML; every section and field is optional and falls back to
//! the defaults below:
//!
//! ```toml
//! markets = ["SP500", "CSI300"]
//!
//! [regime]
//! window = 126
//!
//! [cppi]
//! initial_capital = 100.0
//! protection_level = 0.95
//! multiplier = 4.0
//!
//! [bootstrap]
//! block_size = 20
//! target_length = 252
//! n_simulations = 1000
//! seed = 42
//! parallel = true
//!
//! [data]
//! start = "2015-01-01"
//! end = "2024-11-01"
//! risk_free_fallback_pct = 2.0
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use cppilab_core::data::{AlignOptions, DEFAULT_RISK_FREE_COLUMN};
use cppilab_core::engine::CppiParams;
use cppilab_core::regime::RegimeConfig;
use cppilab_core::AnalysisError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bootstrap::BootstrapConfig;

/// Content hash of a configuration.
pub type RunId = String;

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] AnalysisError),
}

/// Full configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Markets to analyze, matched against data column names.
    pub markets: Vec<String>,
    pub regime: RegimeConfig,
    pub cppi: CppiParams,
    pub bootstrap: BootstrapConfig,
    pub data: DataConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            markets: vec!["SP500".into(), "CSI300".into()],
            regime: RegimeConfig::default(),
            cppi: CppiParams::default(),
            bootstrap: BootstrapConfig::default(),
            data: DataConfig::default(),
        }
    }
}

/// Data window and risk-free handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// First date to keep (inclusive).
    pub start: Option<NaiveDate>,
    /// Last date to keep (inclusive).
    pub end: Option<NaiveDate>,
    /// Annualized rate in percent used when the data has no risk-free column.
    pub risk_free_fallback_pct: f64,
    /// Name of the risk-free column in imported CSV files.
    pub risk_free_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            risk_free_fallback_pct: AlignOptions::default().risk_free_fallback_pct,
            risk_free_column: DEFAULT_RISK_FREE_COLUMN.to_string(),
        }
    }
}

impl DataConfig {
    pub fn align_options(&self) -> AlignOptions {
        AlignOptions {
            risk_free_fallback_pct: self.risk_free_fallback_pct,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameters that do not depend on the data.
    ///
    /// `block_size` against the series length is checked when the bootstrap
    /// runs.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.markets.is_empty() {
            return Err(AnalysisError::invalid("at least one market is required"));
        }
        if let Some(m) = self.markets.iter().find(|m| m.trim().is_empty()) {
            return Err(AnalysisError::invalid(format!("blank market name '{m}'")));
        }
        if self.regime.window < 2 {
            return Err(AnalysisError::invalid("regime window must be >= 2"));
        }
        self.cppi.validate()?;
        let b = &self.bootstrap;
        if b.block_size == 0 || b.target_length == 0 || b.n_simulations == 0 {
            return Err(AnalysisError::invalid(
                "block_size, target_length and n_simulations must be > 0",
            ));
        }
        if !self.data.risk_free_fallback_pct.is_finite() {
            return Err(AnalysisError::invalid("risk_free_fallback_pct must be finite"));
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(AnalysisError::invalid(format!(
                    "data.start {start} is after data.end {end}"
                )));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Identical configurations share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
