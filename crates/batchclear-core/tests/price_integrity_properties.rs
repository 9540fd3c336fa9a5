//! Property-based tests for price integrity.
//! Damping exactness, bound and fee ranges, and reserve positivity after
//! arbitrary batches.

mod common;

use proptest::prelude::*;

use batchclear_core::validation::{DeviationBoundCalculator, FeeSurchargeCalculator, PriceDamper};
use batchclear_core::{
    ClearingError, CurveParams, Pool, ReferencePriceData, Regime, StablecoinContext, VolatilityData,
    VolatilityTier, Wad, MAX_BPS, MAX_EFFECTIVE_FEE_BPS, WAD,
};

use common::*;

// ============================================================================
// Test Strategies
// ============================================================================

fn regime() -> impl Strategy<Value = Regime> {
    prop::sample::select(Regime::ALL.to_vec())
}

fn tier() -> impl Strategy<Value = VolatilityTier> {
    prop::sample::select(vec![
        VolatilityTier::Low,
        VolatilityTier::Medium,
        VolatilityTier::High,
        VolatilityTier::Extreme,
    ])
}

/// Reference prices from 0.001 to 1,000,000
fn reference_price() -> impl Strategy<Value = Wad> {
    (WAD / 1_000..1_000_000 * WAD).prop_map(Wad)
}

fn probability() -> impl Strategy<Value = Wad> {
    (0u128..=WAD).prop_map(Wad)
}

// ============================================================================
// Damping Properties
// ============================================================================

proptest! {
    /// Within the bound, the raw price passes through untouched
    #[test]
    fn prop_tier_one_is_exact(
        reference in reference_price(),
        bound_bps in 0u32..=MAX_BPS,
        position in 0u128..=10_000,
        above in any::<bool>(),
    ) {
        let max_deviation = reference.raw() * bound_bps as u128 / 10_000;
        let offset = max_deviation * position / 10_000;
        let raw = if above {
            Wad(reference.raw() + offset)
        } else {
            Wad(reference.raw() - offset)
        };
        prop_assume!(!raw.is_zero());

        let outcome = PriceDamper.damp(raw, reference, bound_bps, Wad::ZERO).unwrap();
        prop_assert_eq!(outcome.final_price, raw);
        prop_assert!(!outcome.damped);
    }

    /// Outside the bound, the price lands exactly on the boundary, on the raw side
    #[test]
    fn prop_tier_two_pins_to_boundary(
        reference in reference_price(),
        bound_bps in 0u32..9_000,
        excess in 1u128..1_000 * WAD,
        above in any::<bool>(),
    ) {
        let max_deviation = reference.raw() * bound_bps as u128 / 10_000;
        let raw = if above {
            Wad(reference.raw() + max_deviation + excess)
        } else {
            let distance = max_deviation + excess;
            prop_assume!(distance < reference.raw());
            Wad(reference.raw() - distance)
        };

        let outcome = PriceDamper.damp(raw, reference, bound_bps, Wad::ZERO).unwrap();
        prop_assert!(outcome.damped);
        prop_assert_eq!(outcome.final_price.abs_diff(reference).raw(), max_deviation);
        if max_deviation > 0 {
            prop_assert_eq!(outcome.final_price > reference, raw > reference);
        }
        prop_assert!(!outcome.final_price.is_zero());
    }

    /// Effective bound stays within [0, 10000] for every composition
    #[test]
    fn prop_bound_in_range(
        base in 0u32..=MAX_BPS,
        regime in regime(),
        usdt in any::<bool>(),
        usdc in any::<bool>(),
        tier in prop::option::of(tier()),
    ) {
        let context = StablecoinContext {
            usdt_dominant: usdt,
            usdc_dominant: usdc,
            ..StablecoinContext::neutral()
        };
        let volatility = tier.map(|tier| VolatilityData::new(tier, 1));
        let bound = DeviationBoundCalculator::new(base).compute(regime, Some(&context), volatility.as_ref());
        prop_assert!(bound.bound_bps <= MAX_BPS);
        prop_assert_eq!(bound.stealth, regime.signals_danger() && tier == Some(VolatilityTier::Low));
    }

    /// Base fee <= effective fee <= cap
    #[test]
    fn prop_fee_bounded(
        base in 0u32..=MAX_EFFECTIVE_FEE_BPS,
        regime in regime(),
        probability in probability(),
        stealth in any::<bool>(),
    ) {
        let fee = FeeSurchargeCalculator::default().effective_fee(base, regime, probability, stealth);
        prop_assert!(fee >= base);
        prop_assert!(fee <= MAX_EFFECTIVE_FEE_BPS);
    }
}

// ============================================================================
// Settlement Properties
// ============================================================================

fn order_strategy() -> impl Strategy<Value = (bool, u128)> {
    (any::<bool>(), 1u128..200_000 * WAD)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Successful batches leave both reserves positive and match the store;
    /// failed batches leave the pool untouched
    #[test]
    fn prop_reserves_stay_positive(
        reserve0 in 1_000u128 * WAD..5_000_000 * WAD,
        reserve1 in 1_000u128 * WAD..5_000_000 * WAD,
        orders in prop::collection::vec(order_strategy(), 1..8),
        reference in prop::option::of(reference_price()),
        regime in regime(),
    ) {
        let pool = Pool::new(POOL, TOKEN0, TOKEN1, reserve0, reserve1, 30, CurveParams::default()).unwrap();
        let fixture = fixture_with_pool(pool);
        if let Some(price) = reference {
            fixture.set_reference(StaticReference::new(ReferencePriceData::new(price, regime, NOW)));
        }

        let batch: Vec<_> = orders
            .iter()
            .map(|&(zero_for_one, amount)| {
                if zero_for_one {
                    sell_token0(ALICE, amount)
                } else {
                    sell_token1(BOB, amount)
                }
            })
            .collect();

        let before = fixture.engine.store().snapshot(&POOL).unwrap();
        match fixture.engine.settle(&KEEPER, &POOL, 1, &batch) {
            Ok(result) => {
                prop_assert!(result.reserve0_after > 0);
                prop_assert!(result.reserve1_after > 0);
                prop_assert!(!result.clearing_price.is_zero());
                prop_assert!(result.protocol_fees.token0 <= result.fees_collected.token0);
                prop_assert!(result.protocol_fees.token1 <= result.fees_collected.token1);

                let after = fixture.engine.store().snapshot(&POOL).unwrap();
                prop_assert_eq!(after.reserve0, result.reserve0_after);
                prop_assert_eq!(after.reserve1, result.reserve1_after);
            }
            Err(err) => {
                prop_assert!(matches!(
                    err,
                    ClearingError::ReserveDepleted | ClearingError::TransferFailed(_)
                ));
                prop_assert_eq!(fixture.engine.store().snapshot(&POOL).unwrap(), before);
            }
        }
    }
}

