//! Three-tier price damping against the reference price.
//!
//! - Tier 1: within the bound, the raw price passes through unchanged.
//! - Tier 2: outside it, a golden-ratio offset clamped to the bound pins the
//!   price at `reference ± max_deviation`, on the side the raw price moved.
//! - Tier 3: a manipulation probability above 0.7 raises a non-blocking alert.

use tracing::debug;

use crate::constants::{MANIPULATION_ALERT_THRESHOLD, PHI_WAD};
use crate::errors::{ClearingError, ClearingResult};
use crate::math::Wad;

/// Final price decision for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DampingOutcome {
    pub final_price: Wad,
    /// Raw price was outside the bound and got pinned to it
    pub damped: bool,
    /// Manipulation probability crossed the alert threshold
    pub alert: bool,
    pub max_deviation: Wad,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PriceDamper;

impl PriceDamper {
    pub fn damp(
        &self,
        raw_price: Wad,
        reference_price: Wad,
        bound_bps: u32,
        manipulation_probability: Wad,
    ) -> ClearingResult<DampingOutcome> {
        let max_deviation = reference_price.apply_bps(bound_bps)?;
        let deviation = raw_price.abs_diff(reference_price);
        let alert = manipulation_probability.raw() > MANIPULATION_ALERT_THRESHOLD;

        if deviation <= max_deviation {
            return Ok(DampingOutcome {
                final_price: raw_price,
                damped: false,
                alert,
                max_deviation,
            });
        }

        let offset = max_deviation.checked_mul(Wad(PHI_WAD))?.min(max_deviation);
        let final_price = if raw_price > reference_price {
            reference_price.checked_add(offset)?
        } else {
            reference_price.checked_sub(offset)?
        };
        if final_price.is_zero() {
            return Err(ClearingError::InvalidPrice);
        }

        debug!(
            raw = %raw_price,
            reference = %reference_price,
            damped = %final_price,
            bound_bps,
            "price pinned to deviation bound"
        );

        Ok(DampingOutcome {
            final_price,
            damped: true,
            alert,
            max_deviation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;

    fn wad(units: u128, hundredths: u128) -> Wad {
        Wad(units * WAD + hundredths * WAD / 100)
    }

    #[test]
    fn test_tier_one_pass_through() {
        let damper = PriceDamper;
        let reference = wad(2, 0);

        // 4.9% above a 5% bound
        let raw = Wad(reference.raw() + reference.raw() * 490 / 10_000);
        let outcome = damper.damp(raw, reference, 500, Wad::ZERO).unwrap();
        assert_eq!(outcome.final_price, raw);
        assert!(!outcome.damped);

        // Exactly on the boundary still passes
        let edge = wad(2, 10);
        let outcome = damper.damp(edge, reference, 500, Wad::ZERO).unwrap();
        assert_eq!(outcome.final_price, edge);
        assert!(!outcome.damped);
    }

    #[test]
    fn test_tier_two_pins_to_boundary() {
        let damper = PriceDamper;
        let reference = wad(2, 0);

        let above = damper.damp(wad(3, 0), reference, 500, Wad::ZERO).unwrap();
        assert!(above.damped);
        assert_eq!(above.final_price, wad(2, 10));
        assert_eq!(above.max_deviation, wad(0, 10));

        let below = damper.damp(wad(1, 0), reference, 500, Wad::ZERO).unwrap();
        assert!(below.damped);
        assert_eq!(below.final_price, wad(1, 90));
    }

    #[test]
    fn test_zero_bound_pins_to_reference() {
        let damper = PriceDamper;
        let reference = wad(2, 0);
        let outcome = damper.damp(wad(2, 1), reference, 0, Wad::ZERO).unwrap();
        assert!(outcome.damped);
        assert_eq!(outcome.final_price, reference);
    }

    #[test]
    fn test_manipulation_alert_threshold() {
        let damper = PriceDamper;
        let reference = wad(2, 0);
        let at_threshold = Wad(MANIPULATION_ALERT_THRESHOLD);
        let above_threshold = Wad(MANIPULATION_ALERT_THRESHOLD + 1);

        let quiet = damper.damp(reference, reference, 500, at_threshold).unwrap();
        assert!(!quiet.alert);

        let loud = damper.damp(wad(5, 0), reference, 500, above_threshold).unwrap();
        assert!(loud.alert);
        // The alert never changes the price decision
        assert_eq!(loud.final_price, wad(2, 10));
    }
}
