//! Shared error kinds for the analysis core.
//!
//! Degenerate metrics (zero tracking error, empty return series) are not
//! errors: the metric functions return their defined fallback of 0.0.

use thiserror::Error;

/// Errors raised by the simulators, the regime classifier and the bootstrap.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Economically meaningless input. Fatal to the call that detected it.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Series too short for the requested window or target length.
    #[error("insufficient data: need {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Every bootstrap simulation for a market was dropped.
    #[error("empty result set: no simulations survived for market '{market}'")]
    EmptyResultSet { market: String },
}

impl AnalysisError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Reject empty, non-finite or non-positive price paths.
pub fn validate_prices(prices: &[f64]) -> Result<(), AnalysisError> {
    if prices.is_empty() {
        return Err(AnalysisError::invalid("price series is empty"));
    }
    if let Some((i, p)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(AnalysisError::invalid(format!(
            "price at index {i} must be finite and > 0, got {p}"
        )));
    }
    Ok(())
}
