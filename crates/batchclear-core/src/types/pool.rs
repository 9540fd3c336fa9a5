//! # Pool State
//!
//! Two-token reserve pool as seen by settlement. Registration and LP
//! accounting live with the pool registry; settlement only reads the pool and
//! writes reserves back.

use crate::constants::{DEFAULT_AMPLIFICATION, MAX_EFFECTIVE_FEE_BPS};
use crate::curve::CONSTANT_PRODUCT_CURVE;
use crate::errors::{ClearingError, ClearingResult};
use crate::math::{liquidity_marker, Rounding, Wad};
use crate::types::{Address, Direction, PoolId};

/// Curve selection and parameters for a pool
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveParams {
    /// Registered curve identifier
    pub curve_id: String,
    /// Stable-swap amplification coefficient; ignored by other curves
    pub amplification: u64,
}

impl CurveParams {
    pub fn new(curve_id: impl Into<String>) -> Self {
        Self {
            curve_id: curve_id.into(),
            amplification: DEFAULT_AMPLIFICATION,
        }
    }

    pub fn with_amplification(mut self, amplification: u64) -> Self {
        self.amplification = amplification;
        self
    }
}

impl Default for CurveParams {
    fn default() -> Self {
        Self::new(CONSTANT_PRODUCT_CURVE)
    }
}

/// Pool state
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool {
    pub id: PoolId,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
    /// Base fee rate in basis points
    pub fee_bps: u32,
    /// Aggregate liquidity marker, sqrt(reserve0 * reserve1)
    pub liquidity: u128,
    pub curve: CurveParams,
    pub initialized: bool,
    /// Sequence number of the last settled batch
    pub last_batch_id: Option<u64>,
}

impl Pool {
    /// Create an initialized pool with positive reserves
    pub fn new(
        id: PoolId,
        token0: Address,
        token1: Address,
        reserve0: u128,
        reserve1: u128,
        fee_bps: u32,
        curve: CurveParams,
    ) -> ClearingResult<Self> {
        let mut pool = Self::uninitialized(id, token0, token1, fee_bps, curve)?;
        pool.initialize(reserve0, reserve1)?;
        Ok(pool)
    }

    /// Create a registered pool that has not received liquidity yet
    pub fn uninitialized(
        id: PoolId,
        token0: Address,
        token1: Address,
        fee_bps: u32,
        curve: CurveParams,
    ) -> ClearingResult<Self> {
        if id.is_zero() || token0.is_zero() || token1.is_zero() {
            return Err(ClearingError::ZeroAddress);
        }
        if token0 == token1 {
            return Err(ClearingError::InvalidPool("identical tokens"));
        }
        if fee_bps > MAX_EFFECTIVE_FEE_BPS {
            return Err(ClearingError::InvalidPool("fee above cap"));
        }

        Ok(Self {
            id,
            token0,
            token1,
            reserve0: 0,
            reserve1: 0,
            fee_bps,
            liquidity: 0,
            curve,
            initialized: false,
            last_batch_id: None,
        })
    }

    /// Seed reserves and mark the pool ready for settlement
    pub fn initialize(&mut self, reserve0: u128, reserve1: u128) -> ClearingResult<()> {
        if self.initialized {
            return Err(ClearingError::InvalidPool("already initialized"));
        }
        if reserve0 == 0 || reserve1 == 0 {
            return Err(ClearingError::InvalidPool("zero reserves"));
        }
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
        self.liquidity = liquidity_marker(reserve0, reserve1);
        self.initialized = true;
        Ok(())
    }

    /// Marginal price, token1 per token0.
    ///
    /// A price below one fixed-point unit (`reserve0 > reserve1 * 1e18`) is
    /// `InvalidPrice`.
    pub fn spot_price(&self) -> ClearingResult<Wad> {
        let price = Wad::from_ratio(self.reserve1, self.reserve0, Rounding::Down)?;
        if price.is_zero() {
            return Err(ClearingError::InvalidPrice);
        }
        Ok(price)
    }

    /// Order direction for an input/output token pair, if it belongs to this pool
    pub fn direction_of(&self, token_in: &Address, token_out: &Address) -> Option<Direction> {
        if *token_in == self.token0 && *token_out == self.token1 {
            Some(Direction::ZeroForOne)
        } else if *token_in == self.token1 && *token_out == self.token0 {
            Some(Direction::OneForZero)
        } else {
            None
        }
    }

    /// (reserve_in, reserve_out) for a swap direction
    pub fn reserves_for(&self, direction: Direction) -> (u128, u128) {
        match direction {
            Direction::ZeroForOne => (self.reserve0, self.reserve1),
            Direction::OneForZero => (self.reserve1, self.reserve0),
        }
    }

    /// Input token of a swap direction
    pub fn token_in(&self, direction: Direction) -> Address {
        match direction {
            Direction::ZeroForOne => self.token0,
            Direction::OneForZero => self.token1,
        }
    }
}
