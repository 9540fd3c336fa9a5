//! # Curve Pricing Engine
//!
//! Aggregates a batch's order flow per direction, nets the two directions at
//! the pool's spot rate and prices the remainder on the pool's curve.
//! Everything here is a pure function of the pool snapshot and the orders.

use tracing::debug;

use crate::errors::{ClearingError, ClearingResult};
use crate::math::{mul_div, safe_add_u128, Rounding, Wad};
use crate::types::{Direction, Pool, SwapOrder, TokenAmounts};

use super::CurveRegistry;

/// Validated, aggregated order flow of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFlow {
    /// Gross input per token
    pub gross_in: TokenAmounts,
    /// Direction of each order, in batch order
    pub directions: Vec<Direction>,
}

/// Raw execution price of the dominant direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPrice {
    /// Token1 per token0
    pub price: Wad,
    pub direction: Direction,
    /// Net input after cancelling the opposing flow
    pub net_amount_in: u128,
    pub amount_out: u128,
}

/// Validate orders against the pool and sum their inputs per direction
pub fn aggregate_flow(pool: &Pool, orders: &[SwapOrder]) -> ClearingResult<OrderFlow> {
    if orders.is_empty() {
        return Err(ClearingError::EmptyBatch);
    }

    let mut gross_in = TokenAmounts::default();
    let mut directions = Vec::with_capacity(orders.len());

    for (index, order) in orders.iter().enumerate() {
        if order.amount_in == 0 {
            return Err(ClearingError::invalid_order(index, "zero input amount"));
        }
        if order.trader.is_zero() {
            return Err(ClearingError::invalid_order(index, "zero trader"));
        }
        let direction = pool
            .direction_of(&order.token_in, &order.token_out)
            .ok_or_else(|| ClearingError::invalid_order(index, "tokens not in pool"))?;

        let side = gross_in.input_side_mut(direction);
        *side = safe_add_u128(*side, order.amount_in)?;
        directions.push(direction);
    }

    Ok(OrderFlow {
        gross_in,
        directions,
    })
}

/// Raw price discovery against a pool's configured curve
pub struct CurvePricingEngine<'a> {
    registry: &'a CurveRegistry,
}

impl<'a> CurvePricingEngine<'a> {
    pub fn new(registry: &'a CurveRegistry) -> Self {
        Self { registry }
    }

    /// Price the net flow of a batch.
    ///
    /// Returns `None` when the two directions cancel out (or the remainder is
    /// too small to produce any output), in which case no raw price exists.
    pub fn raw_price(&self, pool: &Pool, flow: &OrderFlow) -> ClearingResult<Option<RawPrice>> {
        let strategy = self.registry.get(&pool.curve.curve_id)?;

        let in0 = flow.gross_in.token0;
        let in1 = flow.gross_in.token1;
        // Token1 flow expressed in token0 at the spot rate
        let in1_as_token0 = mul_div(in1, pool.reserve0, pool.reserve1, Rounding::Down)?;

        let (direction, net_amount_in) = if in0 > in1_as_token0 {
            (Direction::ZeroForOne, in0 - in1_as_token0)
        } else if in1_as_token0 > in0 {
            let in0_as_token1 = mul_div(in0, pool.reserve1, pool.reserve0, Rounding::Down)?;
            (Direction::OneForZero, in1.saturating_sub(in0_as_token1))
        } else {
            (Direction::ZeroForOne, 0)
        };

        if net_amount_in == 0 {
            debug!(pool = %pool.id, "order flow nets to zero, no raw price");
            return Ok(None);
        }

        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        // Fees are charged at settlement, not during price discovery
        let amount_out =
            strategy.get_amount_out(net_amount_in, reserve_in, reserve_out, 0, &pool.curve)?;
        if amount_out == 0 {
            debug!(pool = %pool.id, net_amount_in, "net flow below pricing resolution");
            return Ok(None);
        }

        let price = match direction {
            Direction::ZeroForOne => Wad::from_ratio(amount_out, net_amount_in, Rounding::Down)?,
            Direction::OneForZero => Wad::from_ratio(net_amount_in, amount_out, Rounding::Down)?,
        };
        if price.is_zero() {
            return Ok(None);
        }

        debug!(
            pool = %pool.id,
            ?direction,
            net_amount_in,
            amount_out,
            price = %price,
            "raw curve price"
        );

        Ok(Some(RawPrice {
            price,
            direction,
            net_amount_in,
            amount_out,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, CurveParams, PoolId};

    const UNIT: u128 = 1_000_000_000_000_000_000;

    fn pool() -> Pool {
        Pool::new(
            PoolId::repeat(9),
            Address::repeat(1),
            Address::repeat(2),
            1_000_000 * UNIT,
            2_000_000 * UNIT,
            30,
            CurveParams::default(),
        )
        .unwrap()
    }

    fn buy_one(amount: u128) -> SwapOrder {
        SwapOrder::new(Address::repeat(5), Address::repeat(1), Address::repeat(2), amount)
    }

    fn buy_zero(amount: u128) -> SwapOrder {
        SwapOrder::new(Address::repeat(6), Address::repeat(2), Address::repeat(1), amount)
    }

    #[test]
    fn test_aggregate_flow() {
        let pool = pool();
        let flow = aggregate_flow(&pool, &[buy_one(10), buy_zero(4), buy_one(5)]).unwrap();
        assert_eq!(flow.gross_in, TokenAmounts::new(15, 4));
        assert_eq!(
            flow.directions,
            vec![Direction::ZeroForOne, Direction::OneForZero, Direction::ZeroForOne]
        );
    }

    #[test]
    fn test_aggregate_rejects_bad_orders() {
        let pool = pool();
        assert_eq!(aggregate_flow(&pool, &[]), Err(ClearingError::EmptyBatch));
        assert_eq!(
            aggregate_flow(&pool, &[buy_one(10), buy_one(0)]),
            Err(ClearingError::invalid_order(1, "zero input amount"))
        );

        let foreign = SwapOrder::new(Address::repeat(5), Address::repeat(1), Address::repeat(3), 1);
        assert_eq!(
            aggregate_flow(&pool, &[foreign]),
            Err(ClearingError::invalid_order(0, "tokens not in pool"))
        );
    }

    #[test]
    fn test_raw_price_zero_for_one() {
        let pool = pool();
        let registry = CurveRegistry::default();
        let engine = CurvePricingEngine::new(&registry);

        let flow = aggregate_flow(&pool, &[buy_one(1_000 * UNIT)]).unwrap();
        let raw = engine.raw_price(&pool, &flow).unwrap().unwrap();

        assert_eq!(raw.direction, Direction::ZeroForOne);
        assert_eq!(raw.net_amount_in, 1_000 * UNIT);
        // Selling token0 pushes the price a little below spot (2.0)
        assert!(raw.price < pool.spot_price().unwrap());
        assert!(raw.price > Wad::from_ratio(199, 100, Rounding::Down).unwrap());
    }

    #[test]
    fn test_raw_price_nets_opposing_flow() {
        let pool = pool();
        let registry = CurveRegistry::default();
        let engine = CurvePricingEngine::new(&registry);

        // 1000 token0 against 3000 token1 (= 1500 token0 at spot): net 1000 token1 in
        let flow = aggregate_flow(&pool, &[buy_one(1_000 * UNIT), buy_zero(3_000 * UNIT)]).unwrap();
        let raw = engine.raw_price(&pool, &flow).unwrap().unwrap();

        assert_eq!(raw.direction, Direction::OneForZero);
        assert_eq!(raw.net_amount_in, 1_000 * UNIT);
        // Buying token0 pushes the price above spot
        assert!(raw.price > pool.spot_price().unwrap());
    }

    #[test]
    fn test_balanced_flow_has_no_price() {
        let pool = pool();
        let registry = CurveRegistry::default();
        let engine = CurvePricingEngine::new(&registry);

        let flow = aggregate_flow(&pool, &[buy_one(500 * UNIT), buy_zero(1_000 * UNIT)]).unwrap();
        assert_eq!(engine.raw_price(&pool, &flow).unwrap(), None);
    }

    #[test]
    fn test_unknown_curve() {
        let mut pool = pool();
        pool.curve = CurveParams::new("weighted");
        let registry = CurveRegistry::default();
        let engine = CurvePricingEngine::new(&registry);

        let flow = aggregate_flow(&pool, &[buy_one(UNIT)]).unwrap();
        assert_eq!(
            engine.raw_price(&pool, &flow),
            Err(ClearingError::UnknownCurve("weighted".to_string()))
        );
    }
}
