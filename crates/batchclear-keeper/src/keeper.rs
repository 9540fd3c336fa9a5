use std::fs;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use batchclear_core::{
    Account, Address, BatchSettlementEngine, BatchSettlementResult, Clock, InMemoryLedger, PoolId,
    PoolStore, SettlementConfig, SwapOrder, SystemClock, TracingSink,
};

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};
use crate::sources::{ConfiguredReferenceSource, ConfiguredVolatilitySource};

/// One batch of orders for a pool, read from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchFile {
    pub pool: PoolId,

    /// Defaults to the batch after the pool's last settled one
    #[serde(default)]
    pub batch_id: Option<u64>,

    pub orders: Vec<SwapOrder>,
}

impl BatchFile {
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::IoError(format!("Failed to read batch file {}: {}", path, e)))?;
        let batch: BatchFile = serde_json::from_str(&content)?;
        if batch.orders.is_empty() {
            return Err(KeeperError::InvalidBatch(format!("{} contains no orders", path)));
        }
        Ok(batch)
    }
}

/// Settles batches against pools registered from the keeper config, over an
/// in-memory token ledger
pub struct Keeper {
    engine: BatchSettlementEngine,
    ledger: Arc<InMemoryLedger>,
    executor: Address,
}

impl Keeper {
    pub fn new(config: &KeeperConfig) -> KeeperResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &KeeperConfig, clock: Arc<dyn Clock>) -> KeeperResult<Self> {
        config.validate()?;

        let store = Arc::new(PoolStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let credit = |account: Account, token: Address, amount: u128| {
            ledger
                .credit(account, token, amount)
                .map_err(|e| KeeperError::InvalidConfig(e.to_string()))
        };

        for pool_config in &config.pools {
            let pool = pool_config.to_pool()?;
            credit(Account::Pool(pool.id), pool.token0, pool.reserve0)?;
            credit(Account::Pool(pool.id), pool.token1, pool.reserve1)?;
            store.insert(pool)?;
            debug!(pool = %pool_config.id, name = %pool_config.name, "registered pool");
        }
        for balance in &config.traders {
            credit(Account::Trader(balance.trader), balance.token, balance.amount)?;
        }

        let mut settlement = SettlementConfig::new(config.admin)?;
        settlement.add_executor(config.executor)?;
        let engine = BatchSettlementEngine::new(store, ledger.clone(), settlement)
            .with_sink(Arc::new(TracingSink))
            .with_clock(clock.clone());

        let admin = &config.admin;
        let params = &config.settlement;
        engine.set_validation_enabled(admin, params.validation_enabled)?;
        engine.set_max_staleness_secs(admin, params.max_staleness_secs)?;
        engine.set_base_deviation_bps(admin, params.base_deviation_bps)?;
        engine.set_protocol_fee_share_bps(admin, params.protocol_fee_share_bps)?;

        match &config.reference {
            Some(quote) => engine.set_reference_source(
                admin,
                Some(Arc::new(ConfiguredReferenceSource::new(quote.clone(), clock.clone()))),
            )?,
            None if params.validation_enabled => {
                warn!("validation enabled without a reference quote; batches clear at the raw price")
            }
            None => {}
        }
        if let Some(volatility) = &config.volatility {
            engine.set_volatility_source(
                admin,
                Some(Arc::new(ConfiguredVolatilitySource::new(volatility.clone(), clock))),
            )?;
        }

        info!(pools = config.pools.len(), traders = config.traders.len(), "keeper initialized");

        Ok(Self {
            engine,
            ledger,
            executor: config.executor,
        })
    }

    pub fn engine(&self) -> &BatchSettlementEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Settle a batch as the configured executor
    pub fn settle_batch(&self, batch: &BatchFile) -> KeeperResult<BatchSettlementResult> {
        let batch_id = match batch.batch_id {
            Some(id) => id,
            None => self.next_batch_id(&batch.pool)?,
        };
        debug!(pool = %batch.pool, batch_id, orders = batch.orders.len(), "settling batch");
        Ok(self.engine.settle(&self.executor, &batch.pool, batch_id, &batch.orders)?)
    }

    /// Price a batch without moving funds
    pub fn quote_batch(&self, batch: &BatchFile) -> KeeperResult<BatchSettlementResult> {
        Ok(self.engine.quote(&batch.pool, &batch.orders)?)
    }

    fn next_batch_id(&self, pool: &PoolId) -> KeeperResult<u64> {
        let pool = self.engine.store().snapshot(pool)?;
        Ok(pool.last_batch_id.map_or(1, |last| last.saturating_add(1)))
    }
}
