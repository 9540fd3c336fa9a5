//! # Market Context Types
//!
//! Snapshots supplied by external collaborators: reference price with regime
//! classification, stablecoin dominance, and realized volatility.

use crate::constants::*;
use crate::math::Wad;

/// Market regime classification from the reference-price source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Regime {
    Normal,
    Cascade,
    Manipulation,
    HighLeverage,
    Trend,
    LowVolatility,
}

impl Regime {
    pub const ALL: [Regime; 6] = [
        Regime::Normal,
        Regime::Cascade,
        Regime::Manipulation,
        Regime::HighLeverage,
        Regime::Trend,
        Regime::LowVolatility,
    ];

    /// Deviation bound factor as a fraction of 10,000
    pub const fn bound_factor_bps(self) -> u32 {
        match self {
            Regime::Normal => REGIME_FACTOR_NORMAL,
            Regime::Cascade => REGIME_FACTOR_CASCADE,
            Regime::Manipulation => REGIME_FACTOR_MANIPULATION,
            Regime::HighLeverage => REGIME_FACTOR_HIGH_LEVERAGE,
            Regime::Trend => REGIME_FACTOR_TREND,
            Regime::LowVolatility => REGIME_FACTOR_LOW_VOLATILITY,
        }
    }

    /// Fee surcharge as a share of the base fee (10,000 = 100%)
    pub const fn surcharge_share_bps(self) -> u32 {
        match self {
            Regime::Manipulation => MANIPULATION_SURCHARGE_SHARE,
            Regime::Cascade => CASCADE_SURCHARGE_SHARE,
            Regime::HighLeverage => HIGH_LEVERAGE_SURCHARGE_SHARE,
            Regime::Normal | Regime::Trend | Regime::LowVolatility => 0,
        }
    }

    /// Manipulation or cascade
    pub const fn signals_danger(self) -> bool {
        matches!(self, Regime::Manipulation | Regime::Cascade)
    }

    /// Normal, trend or low volatility
    pub const fn is_benign(self) -> bool {
        matches!(self, Regime::Normal | Regime::Trend | Regime::LowVolatility)
    }
}

/// Independently measured volatility classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum VolatilityTier {
    Low,
    Medium,
    High,
    Extreme,
}

/// Reference ("true") price snapshot for a pool
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferencePriceData {
    /// Token1 per token0; zero means "no data"
    pub price: Wad,
    pub confidence: Wad,
    /// Signed z-score of the current deviation (1e18 fixed point)
    pub deviation_z_score: i128,
    pub regime: Regime,
    /// Probability in [0, 1] (1e18 fixed point)
    pub manipulation_probability: Wad,
    /// Unix seconds; zero is never fresh
    pub timestamp: u64,
    pub hash: [u8; 32],
}

impl ReferencePriceData {
    /// Minimal snapshot with a price, regime and timestamp
    pub fn new(price: Wad, regime: Regime, timestamp: u64) -> Self {
        Self {
            price,
            confidence: Wad::ONE,
            deviation_z_score: 0,
            regime,
            manipulation_probability: Wad::ZERO,
            timestamp,
            hash: [0u8; 32],
        }
    }

    pub fn with_manipulation_probability(mut self, probability: Wad) -> Self {
        self.manipulation_probability = probability;
        self
    }
}

/// Stablecoin dominance context
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct StablecoinContext {
    /// Ratio between the two reference stablecoins; zero means "no data"
    pub ratio: Wad,
    pub usdt_dominant: bool,
    pub usdc_dominant: bool,
    pub volatility_multiplier: Wad,
}

impl StablecoinContext {
    pub fn neutral() -> Self {
        Self {
            ratio: Wad::ONE,
            usdt_dominant: false,
            usdc_dominant: false,
            volatility_multiplier: Wad::ONE,
        }
    }

    pub fn usdt_dominant() -> Self {
        Self {
            usdt_dominant: true,
            ..Self::neutral()
        }
    }

    pub fn usdc_dominant() -> Self {
        Self {
            usdc_dominant: true,
            ..Self::neutral()
        }
    }
}

/// Realized volatility snapshot for a pool
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct VolatilityData {
    pub realized_volatility: Wad,
    pub tier: VolatilityTier,
    pub timestamp: u64,
}

impl VolatilityData {
    pub fn new(tier: VolatilityTier, timestamp: u64) -> Self {
        Self {
            realized_volatility: Wad::ZERO,
            tier,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_classification() {
        for regime in Regime::ALL {
            assert!(!(regime.signals_danger() && regime.is_benign()));
        }
        assert!(Regime::Manipulation.signals_danger());
        assert!(Regime::Cascade.signals_danger());
        assert!(!Regime::HighLeverage.signals_danger());
        assert!(!Regime::HighLeverage.is_benign());
        assert!(Regime::Trend.is_benign());
    }

    #[test]
    fn test_regime_factors() {
        assert_eq!(Regime::Normal.bound_factor_bps(), 10_000);
        assert_eq!(Regime::Trend.bound_factor_bps(), 13_000);
        assert_eq!(Regime::Cascade.surcharge_share_bps(), 20_000);
        assert_eq!(Regime::LowVolatility.surcharge_share_bps(), 0);
    }
}
