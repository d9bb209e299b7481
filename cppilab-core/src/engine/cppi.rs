//! Constant Proportion Portfolio Insurance: path-dependent daily rebalancing.
//!
//! Per period:
//! 1. Grow last period's risky sleeve at the risky return and the safe sleeve
//!    at the risk-free rate
//! 2. Grow the floor at the risk-free rate (it never resets downward)
//! 3. Re-allocate: risky = min(multiplier × cushion, portfolio), or 0 once the
//!    cushion is exhausted

use serde::{Deserialize, Serialize};

use super::{pct_change, ValuePath};
use crate::error::{validate_prices, AnalysisError};

/// CPPI strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CppiParams {
    pub initial_capital: f64,
    /// Floor as a fraction of initial capital, in (0, 1).
    pub protection_level: f64,
    /// Exposure multiple of the cushion, >= 1.
    pub multiplier: f64,
}

impl Default for CppiParams {
    fn default() -> Self {
        Self {
            initial_capital: 100.0,
            protection_level: 0.95,
            multiplier: 4.0,
        }
    }
}

impl CppiParams {
    /// Fail fast on parameters with no economic meaning.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(AnalysisError::invalid(format!(
                "initial capital must be > 0, got {}",
                self.initial_capital
            )));
        }
        if !(self.protection_level > 0.0 && self.protection_level < 1.0) {
            return Err(AnalysisError::invalid(format!(
                "protection level must be in (0, 1), got {}",
                self.protection_level
            )));
        }
        if !(self.multiplier.is_finite() && self.multiplier >= 1.0) {
            return Err(AnalysisError::invalid(format!(
                "multiplier must be >= 1, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Per-period snapshot of the CPPI book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CppiState {
    pub portfolio_value: f64,
    pub risk_allocation: f64,
    pub safe_allocation: f64,
    pub floor_value: f64,
    pub cushion: f64,
}

impl CppiState {
    fn rebalanced(portfolio_value: f64, floor_value: f64, multiplier: f64) -> Self {
        let cushion = portfolio_value - floor_value;
        let risk_allocation = if cushion <= 0.0 {
            0.0
        } else {
            (multiplier * cushion).min(portfolio_value).max(0.0)
        };
        Self {
            portfolio_value,
            risk_allocation,
            safe_allocation: portfolio_value - risk_allocation,
            floor_value,
            cushion,
        }
    }

    /// True once the cushion is exhausted and the book sits entirely in the safe asset.
    pub fn is_floored(&self) -> bool {
        self.cushion <= 0.0
    }
}

/// Output of one CPPI run: one state per input period. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    states: Vec<CppiState>,
}

impl SimulationResult {
    pub fn states(&self) -> &[CppiState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Last period's state.
    pub fn terminal(&self) -> Option<&CppiState> {
        self.states.last()
    }

    /// Fraction of periods spent with a non-positive cushion.
    pub fn floored_fraction(&self) -> f64 {
        if self.states.is_empty() {
            return 0.0;
        }
        let floored = self.states.iter().filter(|s| s.is_floored()).count();
        floored as f64 / self.states.len() as f64
    }
}

impl ValuePath for SimulationResult {
    fn portfolio_values(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.portfolio_value).collect()
    }

    fn returns(&self) -> Vec<f64> {
        pct_change(&self.portfolio_values())
    }
}

/// Run CPPI over a risky price path and a per-period risk-free series.
///
/// `risk_free[t]` is the safe return earned between `t - 1` and `t`;
/// `risk_free[0]` is unused.
pub fn simulate_cppi(
    prices: &[f64],
    risk_free: &[f64],
    params: &CppiParams,
) -> Result<SimulationResult, AnalysisError> {
    params.validate()?;
    validate_prices(prices)?;
    if risk_free.len() != prices.len() {
        return Err(AnalysisError::invalid(format!(
            "risk-free series has {} periods, price series has {}",
            risk_free.len(),
            prices.len()
        )));
    }
    if let Some(i) = risk_free.iter().position(|r| !r.is_finite() || *r <= -1.0) {
        return Err(AnalysisError::invalid(format!(
            "risk-free rate at index {i} must be finite and > -1, got {}",
            risk_free[i]
        )));
    }

    let m = params.multiplier;
    let mut states = Vec::with_capacity(prices.len());
    let mut state = CppiState::rebalanced(
        params.initial_capital,
        params.initial_capital * params.protection_level,
        m,
    );
    states.push(state);

    for t in 1..prices.len() {
        let risky_return = prices[t] / prices[t - 1] - 1.0;
        let safe_return = risk_free[t];

        let portfolio_value = state.risk_allocation * (1.0 + risky_return)
            + state.safe_allocation * (1.0 + safe_return);
        let floor_value = state.floor_value * (1.0 + safe_return);

        state = CppiState::rebalanced(portfolio_value, floor_value, m);
        states.push(state);
    }

    Ok(SimulationResult { states })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RF: f64 = 0.0001;

    fn scenario() -> SimulationResult {
        simulate_cppi(
            &[100.0, 110.0, 99.0, 108.9],
            &[RF; 4],
            &CppiParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn initial_allocation() {
        let s0 = scenario().states()[0];
        assert_eq!(s0.portfolio_value, 100.0);
        assert!((s0.floor_value - 95.0).abs() < 1e-12);
        assert!((s0.cushion - 5.0).abs() < 1e-12);
        // min(4 × 5, 100)
        assert!((s0.risk_allocation - 20.0).abs() < 1e-12);
        assert!((s0.safe_allocation - 80.0).abs() < 1e-12);
    }

    #[test]
    fn hand_calculated_path() {
        let result = scenario();
        let s = result.states();

        let pv1 = 20.0 * 1.10 + 80.0 * (1.0 + RF);
        let floor1 = 95.0 * (1.0 + RF);
        let risk1 = (4.0 * (pv1 - floor1)).min(pv1);
        assert!((s[1].portfolio_value - pv1).abs() < 1e-10);
        assert!((s[1].floor_value - floor1).abs() < 1e-10);
        assert!((s[1].risk_allocation - risk1).abs() < 1e-10);

        let pv2 = risk1 * (99.0 / 110.0) + (pv1 - risk1) * (1.0 + RF);
        assert!((s[2].portfolio_value - pv2).abs() < 1e-10);
    }

    #[test]
    fn floor_strictly_increases_with_positive_rate() {
        let result = scenario();
        assert!(result
            .states()
            .windows(2)
            .all(|w| w[1].floor_value > w[0].floor_value));
    }

    #[test]
    fn full_allocation_clamp() {
        // 10 × 50 >= 100, so everything goes to the risky sleeve.
        let params = CppiParams {
            initial_capital: 100.0,
            protection_level: 0.5,
            multiplier: 10.0,
        };
        let result = simulate_cppi(&[100.0, 101.0], &[0.0, 0.0], &params).unwrap();
        let s0 = result.states()[0];
        assert_eq!(s0.risk_allocation, s0.portfolio_value);
        assert_eq!(s0.safe_allocation, 0.0);
    }

    #[test]
    fn crash_floors_the_path() {
        // A 30% gap wipes out a 5% cushion levered 4×.
        let result =
            simulate_cppi(&[100.0, 70.0, 80.0, 90.0], &[0.0; 4], &CppiParams::default()).unwrap();
        let s = result.states();
        assert!(s[1].cushion <= 0.0);
        for state in &s[1..] {
            assert_eq!(state.risk_allocation, 0.0);
            assert!(state.is_floored());
        }
        // Fully in cash at 0% rate: value no longer moves.
        assert_eq!(s[2].portfolio_value, s[1].portfolio_value);
        assert!(result.floored_fraction() > 0.7);
    }

    #[test]
    fn flat_prices_drift_at_risk_free_on_safe_sleeve() {
        let prices = vec![100.0; 252];
        let result = simulate_cppi(&prices, &vec![RF; 252], &CppiParams::default()).unwrap();
        let values = result.portfolio_values();
        assert!(values.windows(2).all(|w| w[1] >= w[0]));
        let s1 = result.states()[1];
        let expected = 20.0 + 80.0 * (1.0 + RF);
        assert!((s1.portfolio_value - expected).abs() < 1e-12);
    }

    #[test]
    fn returns_have_one_fewer_element() {
        let result = scenario();
        assert_eq!(result.returns().len(), 3);
        assert_eq!(result.terminal(), result.states().last());
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let p = CppiParams::default();
        assert!(simulate_cppi(&[100.0, 0.0], &[0.0, 0.0], &p).is_err());
        assert!(simulate_cppi(&[100.0, 101.0], &[0.0], &p).is_err());
        assert!(simulate_cppi(&[], &[], &p).is_err());
        assert!(simulate_cppi(&[100.0, 101.0], &[0.0, f64::NAN], &p).is_err());

        let bad_protection = CppiParams {
            protection_level: 1.0,
            ..p
        };
        assert!(simulate_cppi(&[100.0], &[0.0], &bad_protection).is_err());

        let bad_multiplier = CppiParams {
            multiplier: 0.5,
            ..p
        };
        let err = simulate_cppi(&[100.0], &[0.0], &bad_multiplier).unwrap_err();
        assert!(err.to_string().contains("multiplier"));
    }
}
