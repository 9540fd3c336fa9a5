//! # Safe Math Operations
//!
//! Overflow-checked integer arithmetic.

use integer_sqrt::IntegerSquareRoot;

use crate::errors::{ClearingError, ClearingResult};

macro_rules! safe_arith {
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        pub fn $fn_name(a: $type, b: $type) -> ClearingResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, ClearingError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, ClearingError::MathUnderflow);

/// Chain `value * factor / 10_000`, rounding down, in u32 basis points
pub fn scale_bps(value: u32, factor: u32) -> u32 {
    ((value as u64 * factor as u64) / crate::constants::BPS_DENOMINATOR as u64)
        .min(u32::MAX as u64) as u32
}

/// Geometric mean of two reserves, saturating when the product overflows
pub fn liquidity_marker(reserve0: u128, reserve1: u128) -> u128 {
    match reserve0.checked_mul(reserve1) {
        Some(product) => product.integer_sqrt(),
        None => reserve0
            .integer_sqrt()
            .saturating_mul(reserve1.integer_sqrt()),
    }
}
