//! Staged settlement of one batch.
//!
//! A plan is computed from a pool snapshot without touching it. Settlement
//! verifies the plan, hands its transfers to the ledger and only then writes
//! the new reserves back. Dropping a plan discards it.

use crate::errors::{ClearingError, ClearingResult};
use crate::math::{apply_bps, liquidity_marker, safe_add_u128, safe_sub_u128, Rounding, Wad};
use crate::types::{
    BatchSettlementResult, Direction, OrderExecution, Pool, PoolId, SwapOrder, TokenAmounts,
};

use super::ledger::{Account, Transfer};

/// Pricing decision the plan applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceDecision {
    pub clearing_price: Wad,
    pub raw_price: Option<Wad>,
    pub effective_fee_bps: u32,
    pub validated: bool,
    pub damped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pool_id: PoolId,
    batch_id: u64,
    decision: PriceDecision,
    executions: Vec<OrderExecution>,
    total_in: TokenAmounts,
    total_out: TokenAmounts,
    fees: TokenAmounts,
    protocol_fees: TokenAmounts,
    /// Sum of post-fee inputs per direction, for the output consistency check
    net_in: TokenAmounts,
    order_counts: TokenAmounts,
    reserve0_after: u128,
    reserve1_after: u128,
    transfers: Vec<Transfer>,
}

impl SettlementPlan {
    /// Apply the decision uniformly to every order
    pub fn build(
        pool: &Pool,
        batch_id: u64,
        orders: &[SwapOrder],
        directions: &[Direction],
        decision: PriceDecision,
        protocol_fee_share_bps: u32,
    ) -> ClearingResult<Self> {
        let price = decision.clearing_price;
        if price.is_zero() {
            return Err(ClearingError::InvalidPrice);
        }
        if orders.len() != directions.len() {
            return Err(ClearingError::invalid_order(directions.len(), "direction missing"));
        }

        let mut executions = Vec::with_capacity(orders.len());
        let mut total_in = TokenAmounts::default();
        let mut total_out = TokenAmounts::default();
        let mut fees = TokenAmounts::default();
        let mut net_in = TokenAmounts::default();
        let mut order_counts = TokenAmounts::default();

        for (index, (order, &direction)) in orders.iter().zip(directions).enumerate() {
            let fee = apply_bps(order.amount_in, decision.effective_fee_bps)?;
            let net = safe_sub_u128(order.amount_in, fee)?;
            let amount_out = match direction {
                Direction::ZeroForOne => price.mul_amount(net, Rounding::Down)?,
                Direction::OneForZero => price.div_amount(net, Rounding::Down)?,
            };
            if amount_out < order.min_amount_out {
                return Err(ClearingError::SlippageExceeded {
                    index,
                    amount_out,
                    min_amount_out: order.min_amount_out,
                });
            }

            accumulate(&mut total_in, direction, order.amount_in)?;
            accumulate(&mut fees, direction, fee)?;
            accumulate(&mut net_in, direction, net)?;
            accumulate(&mut order_counts, direction, 1)?;
            let out_side = total_out.output_side_mut(direction);
            *out_side = safe_add_u128(*out_side, amount_out)?;

            executions.push(OrderExecution {
                trader: order.trader,
                direction,
                amount_in: order.amount_in,
                fee,
                amount_out,
                priority: order.priority,
            });
        }

        let protocol_fees = TokenAmounts::new(
            apply_bps(fees.token0, protocol_fee_share_bps)?,
            apply_bps(fees.token1, protocol_fee_share_bps)?,
        );

        let reserve0_after =
            reserve_after(pool.reserve0, total_in.token0, protocol_fees.token0, total_out.token0)?;
        let reserve1_after =
            reserve_after(pool.reserve1, total_in.token1, protocol_fees.token1, total_out.token1)?;

        let transfers = plan_transfers(pool, &executions, protocol_fees);

        Ok(Self {
            pool_id: pool.id,
            batch_id,
            decision,
            executions,
            total_in,
            total_out,
            fees,
            protocol_fees,
            net_in,
            order_counts,
            reserve0_after,
            reserve1_after,
            transfers,
        })
    }

    /// Postconditions that must hold before anything is committed
    pub fn verify(&self) -> ClearingResult<()> {
        if self.decision.clearing_price.is_zero() {
            return Err(ClearingError::InvalidPrice);
        }
        if self.reserve0_after == 0 || self.reserve1_after == 0 {
            return Err(ClearingError::ReserveDepleted);
        }
        if self.protocol_fees.token0 > self.fees.token0
            || self.protocol_fees.token1 > self.fees.token1
        {
            return Err(ClearingError::ProtocolFeeExceedsFee);
        }

        // Each order floors once, so the total trails the ideal by less than
        // one unit per order
        for direction in [Direction::ZeroForOne, Direction::OneForZero] {
            let net = self.net_in.input_side(direction);
            let ideal = match direction {
                Direction::ZeroForOne => self.decision.clearing_price.mul_amount(net, Rounding::Down)?,
                Direction::OneForZero => self.decision.clearing_price.div_amount(net, Rounding::Down)?,
            };
            let paid = self.total_out.output_side(direction);
            let orders = self.order_counts.input_side(direction);
            let shortfall = ideal.checked_sub(paid).ok_or(ClearingError::OutputMismatch)?;
            if orders > 0 && shortfall >= orders {
                return Err(ClearingError::OutputMismatch);
            }
            if orders == 0 && shortfall != 0 {
                return Err(ClearingError::OutputMismatch);
            }
        }

        Ok(())
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Write reserves and batch bookkeeping into the locked pool
    pub fn commit(&self, pool: &mut Pool) -> ClearingResult<()> {
        if pool.id != self.pool_id {
            return Err(ClearingError::PoolNotFound(self.pool_id));
        }
        pool.reserve0 = self.reserve0_after;
        pool.reserve1 = self.reserve1_after;
        pool.liquidity = liquidity_marker(self.reserve0_after, self.reserve1_after);
        pool.last_batch_id = Some(self.batch_id);
        Ok(())
    }

    pub fn into_result(self) -> BatchSettlementResult {
        BatchSettlementResult {
            pool_id: self.pool_id,
            batch_id: self.batch_id,
            clearing_price: self.decision.clearing_price,
            raw_price: self.decision.raw_price,
            total_in: self.total_in,
            total_out: self.total_out,
            fees_collected: self.fees,
            protocol_fees: self.protocol_fees,
            effective_fee_bps: self.decision.effective_fee_bps,
            validated: self.decision.validated,
            damped: self.decision.damped,
            reserve0_after: self.reserve0_after,
            reserve1_after: self.reserve1_after,
            executions: self.executions,
        }
    }
}

fn accumulate(amounts: &mut TokenAmounts, direction: Direction, value: u128) -> ClearingResult<()> {
    let side = amounts.input_side_mut(direction);
    *side = safe_add_u128(*side, value)?;
    Ok(())
}

/// `reserve + in - protocol_fee - out`, which must stay positive
fn reserve_after(reserve: u128, amount_in: u128, protocol_fee: u128, amount_out: u128) -> ClearingResult<u128> {
    let gross = safe_add_u128(reserve, amount_in)?;
    let after = gross
        .checked_sub(protocol_fee)
        .and_then(|value| value.checked_sub(amount_out))
        .ok_or(ClearingError::ReserveDepleted)?;
    if after == 0 {
        return Err(ClearingError::ReserveDepleted);
    }
    Ok(after)
}

/// Inputs first, then outputs, then protocol fees
fn plan_transfers(pool: &Pool, executions: &[OrderExecution], protocol_fees: TokenAmounts) -> Vec<Transfer> {
    let vault = Account::Pool(pool.id);
    let mut transfers = Vec::with_capacity(executions.len() * 2 + 2);

    for execution in executions {
        transfers.push(Transfer {
            token: pool.token_in(execution.direction),
            from: Account::Trader(execution.trader),
            to: vault,
            amount: execution.amount_in,
        });
    }
    for execution in executions.iter().filter(|e| e.amount_out > 0) {
        transfers.push(Transfer {
            token: pool.token_in(execution.direction.opposite()),
            from: vault,
            to: Account::Trader(execution.trader),
            amount: execution.amount_out,
        });
    }
    for (token, amount) in [
        (pool.token0, protocol_fees.token0),
        (pool.token1, protocol_fees.token1),
    ] {
        if amount > 0 {
            transfers.push(Transfer {
                token,
                from: vault,
                to: Account::Treasury,
                amount,
            });
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use crate::types::{Address, CurveParams};

    fn pool() -> Pool {
        Pool::new(
            PoolId::repeat(9),
            Address::repeat(1),
            Address::repeat(2),
            1_000_000,
            2_000_000,
            30,
            CurveParams::default(),
        )
        .unwrap()
    }

    fn decision(price: Wad, fee_bps: u32) -> PriceDecision {
        PriceDecision {
            clearing_price: price,
            raw_price: Some(price),
            effective_fee_bps: fee_bps,
            validated: false,
            damped: false,
        }
    }

    fn order(token_in: u8, token_out: u8, amount: u128) -> SwapOrder {
        SwapOrder::new(Address::repeat(7), Address::repeat(token_in), Address::repeat(token_out), amount)
    }

    #[test]
    fn test_uniform_price_and_fees() {
        let pool = pool();
        let orders = [order(1, 2, 10_000), order(2, 1, 4_000)];
        let directions = [Direction::ZeroForOne, Direction::OneForZero];
        let plan = SettlementPlan::build(&pool, 1, &orders, &directions, decision(Wad(2 * WAD), 30), 1_000)
            .unwrap();
        plan.verify().unwrap();

        let result = plan.clone().into_result();
        // 10_000 - 30 fee = 9_970 net -> 19_940 token1
        assert_eq!(result.executions[0].fee, 30);
        assert_eq!(result.executions[0].amount_out, 19_940);
        // 4_000 - 12 fee = 3_988 net -> 1_994 token0
        assert_eq!(result.executions[1].fee, 12);
        assert_eq!(result.executions[1].amount_out, 1_994);

        assert_eq!(result.fees_collected, TokenAmounts::new(30, 12));
        assert_eq!(result.protocol_fees, TokenAmounts::new(3, 1));
        assert_eq!(result.reserve0_after, 1_000_000 + 10_000 - 3 - 1_994);
        assert_eq!(result.reserve1_after, 2_000_000 + 4_000 - 1 - 19_940);

        // 2 inputs, 2 outputs, 2 protocol fee transfers
        assert_eq!(plan.transfers().len(), 6);
    }

    #[test]
    fn test_slippage_aborts() {
        let pool = pool();
        let orders = [order(1, 2, 1_000), order(1, 2, 1_000).with_min_amount_out(2_000)];
        let directions = [Direction::ZeroForOne, Direction::ZeroForOne];
        let result = SettlementPlan::build(&pool, 1, &orders, &directions, decision(Wad(2 * WAD), 30), 0);
        assert_eq!(
            result,
            Err(ClearingError::SlippageExceeded {
                index: 1,
                amount_out: 1_994,
                min_amount_out: 2_000,
            })
        );
    }

    #[test]
    fn test_reserve_depletion_aborts() {
        let pool = pool();
        // Price far above what the token1 reserve can pay out
        let orders = [order(1, 2, 1_000_000)];
        let result = SettlementPlan::build(
            &pool,
            1,
            &orders,
            &[Direction::ZeroForOne],
            decision(Wad(3 * WAD), 0),
            0,
        );
        assert_eq!(result, Err(ClearingError::ReserveDepleted));
    }

    #[test]
    fn test_commit_updates_pool() {
        let mut pool = pool();
        let orders = [order(1, 2, 10_000)];
        let plan = SettlementPlan::build(&pool, 4, &orders, &[Direction::ZeroForOne], decision(Wad(2 * WAD), 0), 0)
            .unwrap();
        plan.verify().unwrap();
        plan.commit(&mut pool).unwrap();

        assert_eq!(pool.reserve0, 1_010_000);
        assert_eq!(pool.reserve1, 1_980_000);
        assert_eq!(pool.last_batch_id, Some(4));
        assert_eq!(pool.liquidity, liquidity_marker(1_010_000, 1_980_000));
    }

    #[test]
    fn test_output_consistency_detects_tampering() {
        let pool = pool();
        let orders = [order(1, 2, 10_000)];
        let mut plan =
            SettlementPlan::build(&pool, 1, &orders, &[Direction::ZeroForOne], decision(Wad(2 * WAD), 0), 0)
                .unwrap();
        plan.total_out.token1 += 1;
        assert_eq!(plan.verify(), Err(ClearingError::OutputMismatch));
    }
}
