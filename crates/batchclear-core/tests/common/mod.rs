//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use batchclear_core::{
    Account, Address, BatchSettlementEngine, CurveParams, InMemoryLedger, MemorySink, Pool, PoolId,
    ReferencePriceData, ReferencePriceSource, Regime, SettlementConfig, SourceError,
    StablecoinContext, SwapOrder, VolatilityData, VolatilitySource, VolatilityTier, Wad, WAD,
};
use batchclear_core::oracle::FixedClock;

pub const ADMIN: Address = Address::new([0xAA; 32]);
pub const KEEPER: Address = Address::new([0xBB; 32]);
pub const ALICE: Address = Address::new([0x0A; 32]);
pub const BOB: Address = Address::new([0x0B; 32]);
pub const TOKEN0: Address = Address::new([0x01; 32]);
pub const TOKEN1: Address = Address::new([0x02; 32]);
pub const POOL: PoolId = PoolId::new([0x09; 32]);
pub const NOW: u64 = 1_700_000_000;

pub const RESERVE0: u128 = 1_000_000 * WAD;
pub const RESERVE1: u128 = 2_000_000 * WAD;
pub const TRADER_FUNDS: u128 = 1_000_000 * WAD;

/// Reference source serving fixed answers
pub struct StaticReference {
    pub price: Result<ReferencePriceData, SourceError>,
    pub context: Result<StablecoinContext, SourceError>,
}

impl StaticReference {
    pub fn new(price: ReferencePriceData) -> Self {
        Self {
            price: Ok(price),
            context: Ok(StablecoinContext::neutral()),
        }
    }

    pub fn with_context(mut self, context: StablecoinContext) -> Self {
        self.context = Ok(context);
        self
    }

    pub fn failing() -> Self {
        Self {
            price: Err(SourceError::CallFailed("oracle offline".to_string())),
            context: Err(SourceError::CallFailed("oracle offline".to_string())),
        }
    }
}

impl ReferencePriceSource for StaticReference {
    fn get_price(&self, _pool: &PoolId) -> Result<ReferencePriceData, SourceError> {
        self.price.clone()
    }

    fn get_stablecoin_context(&self) -> Result<StablecoinContext, SourceError> {
        self.context.clone()
    }
}

pub struct StaticVolatility(pub VolatilityData);

impl VolatilitySource for StaticVolatility {
    fn get_volatility_data(&self, _pool: &PoolId) -> Result<VolatilityData, SourceError> {
        Ok(self.0.clone())
    }
}

pub struct Fixture {
    pub engine: Arc<BatchSettlementEngine>,
    pub ledger: Arc<InMemoryLedger>,
    pub sink: Arc<MemorySink>,
    pub clock: Arc<FixedClock>,
}

pub fn constant_product_pool() -> Pool {
    Pool::new(POOL, TOKEN0, TOKEN1, RESERVE0, RESERVE1, 30, CurveParams::default()).unwrap()
}

pub fn fixture() -> Fixture {
    fixture_with_pool(constant_product_pool())
}

pub fn fixture_with_pool(pool: Pool) -> Fixture {
    let store = Arc::new(batchclear_core::PoolStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.credit(Account::Pool(pool.id), pool.token0, pool.reserve0).unwrap();
    ledger.credit(Account::Pool(pool.id), pool.token1, pool.reserve1).unwrap();
    for trader in [ALICE, BOB] {
        ledger.credit(Account::Trader(trader), pool.token0, TRADER_FUNDS).unwrap();
        ledger.credit(Account::Trader(trader), pool.token1, TRADER_FUNDS).unwrap();
    }
    store.insert(pool).unwrap();

    let mut config = SettlementConfig::new(ADMIN).unwrap();
    config.add_executor(KEEPER).unwrap();

    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(FixedClock::new(NOW));
    let engine = BatchSettlementEngine::new(store, ledger.clone(), config)
        .with_sink(sink.clone())
        .with_clock(clock.clone());

    Fixture {
        engine: Arc::new(engine),
        ledger,
        sink,
        clock,
    }
}

impl Fixture {
    pub fn set_reference(&self, source: StaticReference) {
        self.engine
            .set_reference_source(&ADMIN, Some(Arc::new(source)))
            .unwrap();
    }

    pub fn set_volatility(&self, tier: VolatilityTier) {
        self.engine
            .set_volatility_source(&ADMIN, Some(Arc::new(StaticVolatility(VolatilityData::new(tier, NOW)))))
            .unwrap();
    }
}

/// Reference at 1.0 against a pool at spot 2.0, so any batch gets pinned
pub fn low_reference(regime: Regime) -> ReferencePriceData {
    ReferencePriceData::new(Wad(WAD), regime, NOW)
}

pub fn sell_token0(trader: Address, amount: u128) -> SwapOrder {
    SwapOrder::new(trader, TOKEN0, TOKEN1, amount)
}

pub fn sell_token1(trader: Address, amount: u128) -> SwapOrder {
    SwapOrder::new(trader, TOKEN1, TOKEN0, amount)
}

/// Price pinned at `1.0 + bound`
pub fn pinned_above_one(bound_bps: u128) -> Wad {
    Wad(WAD + WAD * bound_bps / 10_000)
}
