//! Two-coin stable-swap curve.
//!
//! Invariant: `A·n^n·Σx + D = A·D·n^n + D^(n+1) / (n^n·Πx)` with n = 2.
//! D and the post-trade balance y are solved by Newton iteration.

use ethnum::U256;

use crate::constants::{BPS_DENOMINATOR, STABLE_SWAP_MAX_ITERATIONS};
use crate::errors::{ClearingError, ClearingResult};
use crate::math::{mul_div, u256_to_u128, Rounding};
use crate::types::CurveParams;

use super::CurveStrategy;

const N_COINS: u128 = 2;

/// Curve-style stable-swap exchange function
#[derive(Debug, Clone, Copy, Default)]
pub struct StableSwapCurve;

impl CurveStrategy for StableSwapCurve {
    fn get_amount_out(
        &self,
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
        params: &CurveParams,
    ) -> ClearingResult<u128> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(ClearingError::InvalidPool("zero reserves"));
        }
        if params.amplification == 0 {
            return Err(ClearingError::InvalidPool("zero amplification"));
        }
        if fee_bps > BPS_DENOMINATOR {
            return Err(ClearingError::MathUnderflow);
        }
        if amount_in == 0 {
            return Ok(0);
        }

        let amount_in_after_fee = mul_div(
            amount_in,
            (BPS_DENOMINATOR - fee_bps) as u128,
            BPS_DENOMINATOR as u128,
            Rounding::Down,
        )?;

        let ann = U256::from(params.amplification) * U256::from(N_COINS * N_COINS);
        let x = U256::from(reserve_in);
        let y = U256::from(reserve_out);
        let d = compute_d(x, y, ann)?;

        let new_x = x
            .checked_add(U256::from(amount_in_after_fee))
            .ok_or(ClearingError::MathOverflow)?;
        let new_y = compute_y(new_x, d, ann)?;

        // One unit held back against Newton rounding
        let out = y
            .checked_sub(new_y)
            .and_then(|out| out.checked_sub(U256::ONE))
            .unwrap_or(U256::ZERO);
        u256_to_u128(out).ok_or(ClearingError::MathOverflow)
    }
}

fn checked_mul(a: U256, b: U256) -> ClearingResult<U256> {
    a.checked_mul(b).ok_or(ClearingError::MathOverflow)
}

fn checked_div(a: U256, b: U256) -> ClearingResult<U256> {
    a.checked_div(b).ok_or(ClearingError::DivisionByZero)
}

fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Invariant D for balances (x, y)
fn compute_d(x: U256, y: U256, ann: U256) -> ClearingResult<U256> {
    let n = U256::from(N_COINS);
    let sum = x + y;
    if sum == U256::ZERO {
        return Ok(U256::ZERO);
    }

    let mut d = sum;
    for _ in 0..STABLE_SWAP_MAX_ITERATIONS {
        // D_P = D^(n+1) / (n^n * x * y), built one balance at a time
        let mut d_p = d;
        for balance in [x, y] {
            d_p = checked_div(checked_mul(d_p, d)?, checked_mul(balance, n)?)?;
        }

        let previous = d;
        // D = (Ann*S + D_P*n) * D / ((Ann - 1) * D + (n + 1) * D_P)
        let numerator = checked_mul(checked_mul(ann, sum)? + checked_mul(d_p, n)?, d)?;
        let denominator =
            checked_mul(ann - U256::ONE, d)? + checked_mul(n + U256::ONE, d_p)?;
        d = checked_div(numerator, denominator)?;

        if abs_diff(d, previous) <= U256::ONE {
            return Ok(d);
        }
    }

    Err(ClearingError::NoConvergence)
}

/// Balance of the other coin that keeps D fixed once one balance is `new_x`
fn compute_y(new_x: U256, d: U256, ann: U256) -> ClearingResult<U256> {
    let n = U256::from(N_COINS);

    // c = D^(n+1) / (n^n * x * Ann)
    let mut c = checked_div(checked_mul(d, d)?, checked_mul(new_x, n)?)?;
    c = checked_div(checked_mul(c, d)?, checked_mul(ann, n)?)?;
    let b = new_x + checked_div(d, ann)?;

    let mut y = d;
    for _ in 0..STABLE_SWAP_MAX_ITERATIONS {
        let previous = y;
        // y = (y^2 + c) / (2y + b - D)
        let numerator = checked_mul(y, y)? + c;
        let denominator = (checked_mul(y, n)? + b)
            .checked_sub(d)
            .ok_or(ClearingError::MathUnderflow)?;
        y = checked_div(numerator, denominator)?;

        if abs_diff(y, previous) <= U256::ONE {
            return Ok(y);
        }
    }

    Err(ClearingError::NoConvergence)
}
