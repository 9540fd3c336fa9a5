//! Risk-scaled fee surcharge.
//!
//! Surcharges are shares of the base fee and stack additively before the
//! absolute cap applies.

use crate::constants::*;
use crate::math::{scale_bps, Wad};
use crate::types::Regime;

#[derive(Debug, Clone, Copy)]
pub struct FeeSurchargeCalculator {
    cap_bps: u32,
}

impl Default for FeeSurchargeCalculator {
    fn default() -> Self {
        Self {
            cap_bps: MAX_EFFECTIVE_FEE_BPS,
        }
    }
}

impl FeeSurchargeCalculator {
    pub fn cap_bps(&self) -> u32 {
        self.cap_bps
    }

    pub fn effective_fee(
        &self,
        base_fee_bps: u32,
        regime: Regime,
        manipulation_probability: Wad,
        stealth: bool,
    ) -> u32 {
        let regime_surcharge = scale_bps(base_fee_bps, regime.surcharge_share_bps());
        let manipulation_surcharge =
            scale_bps(base_fee_bps, manipulation_share_bps(manipulation_probability));
        let stealth_surcharge = if stealth {
            scale_bps(base_fee_bps, STEALTH_SURCHARGE_SHARE)
        } else {
            0
        };

        base_fee_bps
            .saturating_add(regime_surcharge)
            .saturating_add(manipulation_surcharge)
            .saturating_add(stealth_surcharge)
            .min(self.cap_bps)
    }
}

/// Probability above 0.8 adds 200%, (0.5, 0.8] adds 100%
fn manipulation_share_bps(probability: Wad) -> u32 {
    let probability = probability.raw();
    if probability > HIGH_MANIPULATION_THRESHOLD {
        HIGH_MANIPULATION_SURCHARGE_SHARE
    } else if probability > ELEVATED_MANIPULATION_THRESHOLD {
        ELEVATED_MANIPULATION_SURCHARGE_SHARE
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probability(percent: u128) -> Wad {
        Wad(percent * WAD / 100)
    }

    #[test]
    fn test_regime_surcharges() {
        let calculator = FeeSurchargeCalculator::default();
        let fee = |regime| calculator.effective_fee(30, regime, Wad::ZERO, false);

        assert_eq!(fee(Regime::Normal), 30);
        assert_eq!(fee(Regime::Manipulation), 60);
        assert_eq!(fee(Regime::Cascade), 90);
        assert_eq!(fee(Regime::HighLeverage), 45);
        assert_eq!(fee(Regime::Trend), 30);
        assert_eq!(fee(Regime::LowVolatility), 30);
    }

    #[test]
    fn test_manipulation_probability_bands() {
        let calculator = FeeSurchargeCalculator::default();
        let fee = |p| calculator.effective_fee(30, Regime::Normal, p, false);

        assert_eq!(fee(probability(50)), 30);
        assert_eq!(fee(Wad(ELEVATED_MANIPULATION_THRESHOLD + 1)), 60);
        assert_eq!(fee(probability(80)), 60);
        assert_eq!(fee(Wad(HIGH_MANIPULATION_THRESHOLD + 1)), 90);
    }

    #[test]
    fn test_stealth_scenario() {
        let calculator = FeeSurchargeCalculator::default();
        assert_eq!(
            calculator.effective_fee(30, Regime::Manipulation, Wad::ZERO, true),
            75
        );
    }

    #[test]
    fn test_cap() {
        let calculator = FeeSurchargeCalculator::default();
        // 200 + 400 + 400 = 1000, clamped
        assert_eq!(
            calculator.effective_fee(200, Regime::Cascade, probability(90), false),
            500
        );
    }

    #[test]
    fn test_bounds_over_inputs() {
        let calculator = FeeSurchargeCalculator::default();
        for base in [0, 1, 30, 100, 499, 500] {
            for regime in Regime::ALL {
                for p in [0, 60, 95] {
                    for stealth in [false, true] {
                        let fee = calculator.effective_fee(base, regime, probability(p), stealth);
                        assert!(fee >= base);
                        assert!(fee <= MAX_EFFECTIVE_FEE_BPS);
                    }
                }
            }
        }
    }
}
