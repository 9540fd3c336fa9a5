//! Effective deviation bound.
//!
//! Composition order is fixed: base bound, regime factor, stablecoin
//! dominance, volatility cross-validation. Each step floors and the result is
//! clamped to 10,000 bps.

use crate::constants::*;
use crate::math::scale_bps;
use crate::types::{Regime, StablecoinContext, VolatilityData, VolatilityTier};

/// How the measured volatility relates to the reported regime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilitySignal {
    /// Danger regime with low measured volatility
    StealthManipulation,
    /// Danger regime corroborated by high or extreme volatility
    ConfirmedDanger,
    /// Benign regime with extreme volatility
    OrganicVolatility,
    Consistent,
}

impl VolatilitySignal {
    pub fn classify(regime: Regime, tier: VolatilityTier) -> Self {
        match (regime.signals_danger(), regime.is_benign(), tier) {
            (true, _, VolatilityTier::Low) => VolatilitySignal::StealthManipulation,
            (true, _, VolatilityTier::High | VolatilityTier::Extreme) => {
                VolatilitySignal::ConfirmedDanger
            }
            (_, true, VolatilityTier::Extreme) => VolatilitySignal::OrganicVolatility,
            _ => VolatilitySignal::Consistent,
        }
    }

    /// Bound factor as a fraction of 10,000
    pub const fn factor_bps(self) -> u32 {
        match self {
            VolatilitySignal::StealthManipulation => STEALTH_MANIPULATION_FACTOR,
            VolatilitySignal::ConfirmedDanger => CONFIRMED_DANGER_FACTOR,
            VolatilitySignal::OrganicVolatility => ORGANIC_VOLATILITY_FACTOR,
            VolatilitySignal::Consistent => BPS_DENOMINATOR,
        }
    }

    pub const fn is_mismatch(self) -> bool {
        matches!(
            self,
            VolatilitySignal::StealthManipulation | VolatilitySignal::OrganicVolatility
        )
    }
}

/// Cross-validation observation, recorded whether or not it adjusted the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossValidation {
    pub regime: Regime,
    pub tier: VolatilityTier,
    pub signal: VolatilitySignal,
    pub mismatch: bool,
    pub adjusted_bound_bps: u32,
}

/// Output of the bound calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviationBound {
    pub bound_bps: u32,
    /// Feeds the stealth fee surcharge
    pub stealth: bool,
    /// Present only when volatility data was available
    pub cross_validation: Option<CrossValidation>,
}

#[derive(Debug, Clone, Copy)]
pub struct DeviationBoundCalculator {
    base_bound_bps: u32,
}

impl Default for DeviationBoundCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DEVIATION_BPS)
    }
}

impl DeviationBoundCalculator {
    pub fn new(base_bound_bps: u32) -> Self {
        Self {
            base_bound_bps: base_bound_bps.min(MAX_BPS),
        }
    }

    pub fn base_bound_bps(&self) -> u32 {
        self.base_bound_bps
    }

    pub fn compute(
        &self,
        regime: Regime,
        stablecoin: Option<&StablecoinContext>,
        volatility: Option<&VolatilityData>,
    ) -> DeviationBound {
        let mut bound = scale_bps(self.base_bound_bps, regime.bound_factor_bps());

        if let Some(context) = stablecoin {
            // USDT is checked first when both flags are set
            if context.usdt_dominant {
                bound = scale_bps(bound, USDT_DOMINANT_FACTOR);
            } else if context.usdc_dominant {
                bound = scale_bps(bound, USDC_DOMINANT_FACTOR);
            }
        }

        let mut stealth = false;
        let mut cross_validation = None;
        if let Some(data) = volatility {
            let signal = VolatilitySignal::classify(regime, data.tier);
            bound = scale_bps(bound, signal.factor_bps()).min(MAX_BPS);
            stealth = signal == VolatilitySignal::StealthManipulation;
            cross_validation = Some(CrossValidation {
                regime,
                tier: data.tier,
                signal,
                mismatch: signal.is_mismatch(),
                adjusted_bound_bps: bound,
            });
        }

        DeviationBound {
            bound_bps: bound.min(MAX_BPS),
            stealth,
            cross_validation,
        }
    }
}
