//! # Order Types
//!
//! Batch-scoped swap orders and the settlement result they produce.

use crate::math::Wad;
use crate::types::{Address, PoolId};

/// Swap direction within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Token0 in, token1 out
    ZeroForOne,
    /// Token1 in, token0 out
    OneForZero,
}

impl Direction {
    pub const fn opposite(self) -> Self {
        match self {
            Direction::ZeroForOne => Direction::OneForZero,
            Direction::OneForZero => Direction::ZeroForOne,
        }
    }
}

/// A pending swap order presented for batch settlement
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapOrder {
    pub trader: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: u128,
    /// Minimum acceptable output
    pub min_amount_out: u128,
    #[cfg_attr(feature = "client", serde(default))]
    pub priority: bool,
}

impl SwapOrder {
    pub fn new(trader: Address, token_in: Address, token_out: Address, amount_in: u128) -> Self {
        Self {
            trader,
            token_in,
            token_out,
            amount_in,
            min_amount_out: 0,
            priority: false,
        }
    }

    pub fn with_min_amount_out(mut self, min_amount_out: u128) -> Self {
        self.min_amount_out = min_amount_out;
        self
    }

    pub fn with_priority(mut self) -> Self {
        self.priority = true;
        self
    }
}

/// A pair of per-token amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenAmounts {
    pub token0: u128,
    pub token1: u128,
}

impl TokenAmounts {
    pub const fn new(token0: u128, token1: u128) -> Self {
        Self { token0, token1 }
    }

    /// Amount of the input token for a direction
    pub fn input_side(&self, direction: Direction) -> u128 {
        match direction {
            Direction::ZeroForOne => self.token0,
            Direction::OneForZero => self.token1,
        }
    }

    /// Amount of the output token for a direction
    pub fn output_side(&self, direction: Direction) -> u128 {
        self.input_side(direction.opposite())
    }

    pub fn input_side_mut(&mut self, direction: Direction) -> &mut u128 {
        match direction {
            Direction::ZeroForOne => &mut self.token0,
            Direction::OneForZero => &mut self.token1,
        }
    }

    pub fn output_side_mut(&mut self, direction: Direction) -> &mut u128 {
        self.input_side_mut(direction.opposite())
    }
}

/// Execution of one order at the clearing price
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderExecution {
    pub trader: Address,
    pub direction: Direction,
    pub amount_in: u128,
    /// Fee taken from the input
    pub fee: u128,
    pub amount_out: u128,
    pub priority: bool,
}

/// Outcome of a settled batch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSettlementResult {
    pub pool_id: PoolId,
    pub batch_id: u64,
    /// Uniform price, token1 per token0
    pub clearing_price: Wad,
    /// Curve price before validation; None when flow netted to zero
    pub raw_price: Option<Wad>,
    pub total_in: TokenAmounts,
    pub total_out: TokenAmounts,
    pub fees_collected: TokenAmounts,
    pub protocol_fees: TokenAmounts,
    pub effective_fee_bps: u32,
    /// Whether reference-price validation ran
    pub validated: bool,
    /// Whether the raw price was pinned to the deviation boundary
    pub damped: bool,
    pub reserve0_after: u128,
    pub reserve1_after: u128,
    pub executions: Vec<OrderExecution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_sides() {
        let mut amounts = TokenAmounts::new(5, 7);
        assert_eq!(amounts.input_side(Direction::ZeroForOne), 5);
        assert_eq!(amounts.output_side(Direction::ZeroForOne), 7);

        *amounts.output_side_mut(Direction::OneForZero) += 1;
        assert_eq!(amounts, TokenAmounts::new(6, 7));
    }

    #[test]
    fn test_order_builder() {
        let order = SwapOrder::new(Address::repeat(1), Address::repeat(2), Address::repeat(3), 10)
            .with_min_amount_out(9)
            .with_priority();
        assert_eq!(order.min_amount_out, 9);
        assert!(order.priority);
    }
}
