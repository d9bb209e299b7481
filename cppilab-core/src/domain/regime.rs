//! Market regime labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the trailing-window return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Bull,
    Bear,
}

/// Trailing volatility relative to its full-sample median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolLevel {
    High,
    Low,
}

/// One of the four trend/volatility regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegimeLabel {
    StableBull,
    VolatileBull,
    StableBear,
    PanicBear,
}

impl RegimeLabel {
    pub const ALL: [RegimeLabel; 4] = [
        RegimeLabel::StableBull,
        RegimeLabel::VolatileBull,
        RegimeLabel::StableBear,
        RegimeLabel::PanicBear,
    ];

    pub fn from_parts(trend: Trend, vol: VolLevel) -> Self {
        match (trend, vol) {
            (Trend::Bull, VolLevel::Low) => RegimeLabel::StableBull,
            (Trend::Bull, VolLevel::High) => RegimeLabel::VolatileBull,
            (Trend::Bear, VolLevel::Low) => RegimeLabel::StableBear,
            (Trend::Bear, VolLevel::High) => RegimeLabel::PanicBear,
        }
    }

    pub fn trend(self) -> Trend {
        match self {
            RegimeLabel::StableBull | RegimeLabel::VolatileBull => Trend::Bull,
            RegimeLabel::StableBear | RegimeLabel::PanicBear => Trend::Bear,
        }
    }

    pub fn vol_level(self) -> VolLevel {
        match self {
            RegimeLabel::StableBull | RegimeLabel::StableBear => VolLevel::Low,
            RegimeLabel::VolatileBull | RegimeLabel::PanicBear => VolLevel::High,
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            RegimeLabel::StableBull => "Stable Bull",
            RegimeLabel::VolatileBull => "Volatile Bull",
            RegimeLabel::StableBear => "Stable Bear",
            RegimeLabel::PanicBear => "Panic Bear",
        }
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip() {
        for label in RegimeLabel::ALL {
            assert_eq!(
                RegimeLabel::from_parts(label.trend(), label.vol_level()),
                label
            );
        }
    }

    #[test]
    fn high_vol_bear_is_panic() {
        assert_eq!(
            RegimeLabel::from_parts(Trend::Bear, VolLevel::High),
            RegimeLabel::PanicBear
        );
        assert_eq!(RegimeLabel::PanicBear.to_string(), "Panic Bear");
    }
}
