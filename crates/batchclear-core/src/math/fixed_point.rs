//! # Fixed-Point Math
//!
//! 1e18-scaled decimal values backed by `u128`. Every multiply-then-divide
//! goes through a 256-bit intermediate so `a * b` never overflows before the
//! division brings it back into range.

use std::fmt;

use ethnum::U256;

use crate::constants::{BPS_DENOMINATOR, WAD};
use crate::errors::{ClearingError, ClearingResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Multiply two values and divide by a third with specified rounding.
/// result = (a * b) / denominator
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> ClearingResult<u128> {
    if denominator == 0 {
        return Err(ClearingError::DivisionByZero);
    }

    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;

    if rounding == Rounding::Up && product % denominator != U256::ZERO {
        quotient += U256::ONE;
    }

    u256_to_u128(quotient).ok_or(ClearingError::MulDivOverflow)
}

/// Narrow a 256-bit value, returning None if it does not fit
pub fn u256_to_u128(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}

/// Scale `value` by `bps / 10_000`, rounding down
pub fn apply_bps(value: u128, bps: u32) -> ClearingResult<u128> {
    mul_div(value, bps as u128, BPS_DENOMINATOR as u128, Rounding::Down)
}

/// A non-negative 1e18 fixed-point decimal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(transparent))]
pub struct Wad(pub u128);

impl Wad {
    pub const ZERO: Wad = Wad(0);
    pub const ONE: Wad = Wad(WAD);

    /// Wrap an already-scaled raw value
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole-unit integer to fixed point
    pub fn from_integer(value: u128) -> ClearingResult<Self> {
        value
            .checked_mul(WAD)
            .map(Self)
            .ok_or(ClearingError::MathOverflow)
    }

    /// `numerator / denominator` as a fixed-point ratio
    pub fn from_ratio(
        numerator: u128,
        denominator: u128,
        rounding: Rounding,
    ) -> ClearingResult<Self> {
        mul_div(numerator, WAD, denominator, rounding).map(Self)
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wad) -> ClearingResult<Wad> {
        self.0
            .checked_add(other.0)
            .map(Wad)
            .ok_or(ClearingError::MathOverflow)
    }

    pub fn checked_sub(self, other: Wad) -> ClearingResult<Wad> {
        self.0
            .checked_sub(other.0)
            .map(Wad)
            .ok_or(ClearingError::MathUnderflow)
    }

    /// Fixed-point product, rounded down
    pub fn checked_mul(self, other: Wad) -> ClearingResult<Wad> {
        mul_div(self.0, other.0, WAD, Rounding::Down).map(Wad)
    }

    /// Fixed-point quotient, rounded down
    pub fn checked_div(self, other: Wad) -> ClearingResult<Wad> {
        mul_div(self.0, WAD, other.0, Rounding::Down).map(Wad)
    }

    /// Absolute difference
    pub fn abs_diff(self, other: Wad) -> Wad {
        Wad(self.0.abs_diff(other.0))
    }

    /// Scale by `bps / 10_000`, rounding down
    pub fn apply_bps(self, bps: u32) -> ClearingResult<Wad> {
        apply_bps(self.0, bps).map(Wad)
    }

    /// Token amount times this price: `amount * self / 1e18`
    pub fn mul_amount(self, amount: u128, rounding: Rounding) -> ClearingResult<u128> {
        mul_div(amount, self.0, WAD, rounding)
    }

    /// Token amount divided by this price: `amount * 1e18 / self`
    pub fn div_amount(self, amount: u128, rounding: Rounding) -> ClearingResult<u128> {
        mul_div(amount, WAD, self.0, rounding)
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:018}", self.0 / WAD, self.0 % WAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div(10, 4, 5, Rounding::Up).unwrap(), 8);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u128::MAX * 2 overflows u128 but not the 256-bit intermediate
        let result = mul_div(u128::MAX, 2, 2, Rounding::Down).unwrap();
        assert_eq!(result, u128::MAX);

        assert_eq!(
            mul_div(u128::MAX, 2, 1, Rounding::Down),
            Err(ClearingError::MulDivOverflow)
        );
        assert_eq!(mul_div(1, 1, 0, Rounding::Down), Err(ClearingError::DivisionByZero));
    }

    #[test]
    fn test_wad_arithmetic() {
        let two = Wad::from_integer(2).unwrap();
        let half = Wad::from_ratio(1, 2, Rounding::Down).unwrap();

        assert_eq!(two.checked_mul(half).unwrap(), Wad::ONE);
        assert_eq!(Wad::ONE.checked_div(two).unwrap(), half);
        assert_eq!(two.abs_diff(half), Wad(1_500_000_000_000_000_000));
        assert_eq!(half.checked_sub(two), Err(ClearingError::MathUnderflow));
        assert_eq!(two.apply_bps(500).unwrap(), Wad(100_000_000_000_000_000));
    }

    #[test]
    fn test_wad_amount_conversion() {
        let price = Wad::from_integer(2000).unwrap();
        assert_eq!(price.mul_amount(3, Rounding::Down).unwrap(), 6000);
        assert_eq!(price.div_amount(6000, Rounding::Down).unwrap(), 3);
        assert_eq!(price.div_amount(1, Rounding::Down).unwrap(), 0);
        assert_eq!(price.div_amount(1, Rounding::Up).unwrap(), 1);
    }

    #[test]
    fn test_wad_display() {
        assert_eq!(Wad::ONE.to_string(), "1.000000000000000000");
        assert_eq!(Wad(1_500_000_000_000_000_000).to_string(), "1.500000000000000000");
    }
}
