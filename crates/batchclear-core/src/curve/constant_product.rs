//! Constant-product curve (`x * y = k`).

use crate::constants::BPS_DENOMINATOR;
use crate::errors::{ClearingError, ClearingResult};
use crate::math::{mul_div, safe_add_u128, Rounding};
use crate::types::CurveParams;

use super::CurveStrategy;

/// Uniswap v2 style exchange function
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantProductCurve;

impl CurveStrategy for ConstantProductCurve {
    fn get_amount_out(
        &self,
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
        _params: &CurveParams,
    ) -> ClearingResult<u128> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(ClearingError::InvalidPool("zero reserves"));
        }
        if fee_bps > BPS_DENOMINATOR {
            return Err(ClearingError::MathUnderflow);
        }
        if amount_in == 0 {
            return Ok(0);
        }

        // out = in' * R_out / (R_in + in')
        let amount_in_after_fee = mul_div(
            amount_in,
            (BPS_DENOMINATOR - fee_bps) as u128,
            BPS_DENOMINATOR as u128,
            Rounding::Down,
        )?;
        let denominator = safe_add_u128(reserve_in, amount_in_after_fee)?;
        mul_div(amount_in_after_fee, reserve_out, denominator, Rounding::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_out() {
        let curve = ConstantProductCurve;
        let params = CurveParams::default();

        // 100 in against 1000/1000: 100 * 1000 / 1100 = 90
        assert_eq!(curve.get_amount_out(100, 1_000, 1_000, 0, &params).unwrap(), 90);

        // With a 30 bps fee: in' = 99 (floored), 99 * 1000 / 1099 = 90
        assert_eq!(curve.get_amount_out(100, 1_000, 1_000, 30, &params).unwrap(), 90);
    }

    #[test]
    fn test_output_below_reserve() {
        let curve = ConstantProductCurve;
        let params = CurveParams::default();
        let out = curve
            .get_amount_out(u64::MAX as u128, 1_000, 1_000, 0, &params)
            .unwrap();
        assert!(out < 1_000);
    }

    #[test]
    fn test_zero_reserves_rejected() {
        let curve = ConstantProductCurve;
        assert!(curve
            .get_amount_out(1, 0, 1_000, 0, &CurveParams::default())
            .is_err());
    }
}
