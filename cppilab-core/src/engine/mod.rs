//! Strategy simulators: pure functions from input series to a value path.
//!
//! - CPPI: daily rebalancing between the risky index and the safe asset
//! - Buy-and-hold: the index itself, rescaled to the initial capital
//!
//! Both expose their trajectory through `ValuePath` so the metrics layer
//! treats strategy and benchmark identically.

pub mod buy_hold;
pub mod cppi;

use crate::domain::ReturnKind;

pub use buy_hold::{simulate_buy_and_hold, BuyHoldResult};
pub use cppi::{simulate_cppi, CppiParams, CppiState, SimulationResult};

/// A simulated portfolio value trajectory.
pub trait ValuePath {
    /// Portfolio value per period.
    fn portfolio_values(&self) -> Vec<f64>;

    /// Period-over-period simple returns (one fewer than the values).
    fn returns(&self) -> Vec<f64>;
}

/// Simple period-over-period change: `v[t] / v[t-1] - 1`.
///
/// A non-positive previous value yields 0.0 for that period.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                ReturnKind::Simple.compute(w[0], w[1])
            } else {
                0.0
            }
        })
        .collect()
}
