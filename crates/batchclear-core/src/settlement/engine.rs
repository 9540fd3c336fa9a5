//! # Batch Settlement Engine
//!
//! Entry point for settling a batch against a pool:
//!
//! 1. **Aggregating**: caller, pool and batch ordering checks; flow summed
//! 2. **Pricing**: raw price of the net flow on the pool's curve
//! 3. **Validating**: deviation bound from regime, stablecoin and volatility
//! 4. **Damping**: raw price passed through or pinned to the bound
//! 5. **Fee adjusting**: risk surcharges on the pool's base fee
//! 6. **Settling**: staged plan verified, transfers applied, reserves committed
//!
//! The pool's mutex is taken with `try_lock` for the whole call, so a
//! re-entrant settlement of the same pool fails with `PoolBusy`. Telemetry
//! records are staged and only emitted once the batch has committed.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::curve::{aggregate_flow, CurvePricingEngine, CurveRegistry, OrderFlow};
use crate::errors::{ClearingError, ClearingResult};
use crate::math::Wad;
use crate::oracle::{
    Clock, GatewayOutcome, ReferencePriceGateway, ReferencePriceSource, StablecoinContextGateway,
    SystemClock, VolatilityGateway, VolatilitySource,
};
use crate::store::PoolStore;
use crate::telemetry::{ConfigChange, SettlementEvent, TelemetrySink, TracingSink};
use crate::types::{Address, BatchSettlementResult, Pool, PoolId, SwapOrder};
use crate::validation::{DeviationBoundCalculator, FeeSurchargeCalculator, PriceDamper};

use super::config::SettlementConfig;
use super::ledger::TokenLedger;
use super::plan::{PriceDecision, SettlementPlan};

pub struct BatchSettlementEngine {
    store: Arc<PoolStore>,
    curves: CurveRegistry,
    config: RwLock<SettlementConfig>,
    ledger: Arc<dyn TokenLedger>,
    sink: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    damper: PriceDamper,
    fees: FeeSurchargeCalculator,
}

impl BatchSettlementEngine {
    /// Engine with the default curves, system clock and tracing telemetry
    pub fn new(store: Arc<PoolStore>, ledger: Arc<dyn TokenLedger>, config: SettlementConfig) -> Self {
        Self {
            store,
            curves: CurveRegistry::default(),
            config: RwLock::new(config),
            ledger,
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
            damper: PriceDamper,
            fees: FeeSurchargeCalculator::default(),
        }
    }

    pub fn with_curves(mut self, curves: CurveRegistry) -> Self {
        self.curves = curves;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<PoolStore> {
        &self.store
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> SettlementConfig {
        self.config.read().clone()
    }

    /// Settle a batch of orders against a pool, atomically
    pub fn settle(
        &self,
        caller: &Address,
        pool_id: &PoolId,
        batch_id: u64,
        orders: &[SwapOrder],
    ) -> ClearingResult<BatchSettlementResult> {
        let config = self.config();
        if !config.is_executor(caller) {
            return Err(ClearingError::Unauthorized);
        }

        let handle = self.store.handle(pool_id)?;
        let mut pool = handle.try_lock().ok_or(ClearingError::PoolBusy(*pool_id))?;
        if !pool.initialized {
            return Err(ClearingError::NotInitialized);
        }
        if let Some(last) = pool.last_batch_id {
            if batch_id <= last {
                return Err(ClearingError::StaleBatch { batch_id, last });
            }
        }

        let mut events = Vec::new();
        let (plan, flow) = self.prepare(&config, &pool, batch_id, orders, &mut events)?;

        // Reserves change only once the ledger has accepted every transfer
        self.ledger
            .apply(plan.transfers())
            .map_err(|err| ClearingError::TransferFailed(err.to_string()))?;
        plan.commit(&mut pool)?;
        drop(pool);

        let result = plan.into_result();
        events.push(SettlementEvent::BatchSettled {
            pool: *pool_id,
            batch_id,
            clearing_price: result.clearing_price,
            effective_fee_bps: result.effective_fee_bps,
        });
        for event in events {
            self.sink.record(event);
        }

        info!(
            pool = %pool_id,
            batch_id,
            orders = flow.directions.len(),
            clearing_price = %result.clearing_price,
            effective_fee_bps = result.effective_fee_bps,
            validated = result.validated,
            damped = result.damped,
            "batch settled"
        );

        Ok(result)
    }

    /// Dry run of a batch against the current pool state.
    ///
    /// Skips authorization, batch ordering, transfers and telemetry. Fails
    /// with `PoolBusy` while the pool is settling.
    pub fn quote(&self, pool_id: &PoolId, orders: &[SwapOrder]) -> ClearingResult<BatchSettlementResult> {
        let config = self.config();
        let pool = self.store.try_snapshot(pool_id)?;
        if !pool.initialized {
            return Err(ClearingError::NotInitialized);
        }
        let batch_id = pool.last_batch_id.map_or(0, |last| last.saturating_add(1));
        let mut events = Vec::new();
        let (plan, _) = self.prepare(&config, &pool, batch_id, orders, &mut events)?;
        Ok(plan.into_result())
    }

    /// Aggregating through fee adjusting, ending in a verified plan
    fn prepare(
        &self,
        config: &SettlementConfig,
        pool: &Pool,
        batch_id: u64,
        orders: &[SwapOrder],
        events: &mut Vec<SettlementEvent>,
    ) -> ClearingResult<(SettlementPlan, OrderFlow)> {
        let flow = aggregate_flow(pool, orders)?;
        let raw = CurvePricingEngine::new(&self.curves).raw_price(pool, &flow)?;

        // Without net flow the batch crosses internally; spot stands in for
        // the curve price and is validated like one
        let decision = match raw {
            Some(raw) => self.decide(config, pool, raw.price, events)?,
            None => {
                let spot = pool.spot_price()?;
                debug!(pool = %pool.id, spot = %spot, "no net flow, pricing at spot");
                PriceDecision {
                    raw_price: None,
                    ..self.decide(config, pool, spot, events)?
                }
            }
        };

        let plan = SettlementPlan::build(
            pool,
            batch_id,
            orders,
            &flow.directions,
            decision,
            config.protocol_fee_share_bps(),
        )?;
        plan.verify()?;
        Ok((plan, flow))
    }

    /// Validate a raw price against the reference and size the fee
    fn decide(
        &self,
        config: &SettlementConfig,
        pool: &Pool,
        raw_price: Wad,
        events: &mut Vec<SettlementEvent>,
    ) -> ClearingResult<PriceDecision> {
        let unvalidated = PriceDecision {
            clearing_price: raw_price,
            raw_price: Some(raw_price),
            effective_fee_bps: pool.fee_bps,
            validated: false,
            damped: false,
        };

        if !config.validation_enabled() {
            debug!(pool = %pool.id, "price validation disabled");
            return Ok(unvalidated);
        }

        let now = self.clock.now();
        let reference_source = config.reference_source();
        let reference = ReferencePriceGateway::new(reference_source.clone(), config.max_staleness_secs())
            .query(&pool.id, now);
        let reference = match reference {
            GatewayOutcome::Available(reference) => reference,
            GatewayOutcome::Unavailable(reason) => {
                debug!(pool = %pool.id, ?reason, "reference price unavailable, skipping validation");
                return Ok(unvalidated);
            }
        };

        let stablecoin = StablecoinContextGateway::new(reference_source).query();
        let volatility = VolatilityGateway::new(config.volatility_source(), config.max_staleness_secs())
            .query(&pool.id, now);

        let bound = DeviationBoundCalculator::new(config.base_deviation_bps()).compute(
            reference.regime,
            stablecoin.as_available(),
            volatility.as_available(),
        );
        if let Some(observation) = bound.cross_validation {
            events.push(SettlementEvent::VolatilityCrossValidation {
                pool: pool.id,
                regime: observation.regime,
                tier: observation.tier,
                mismatch: observation.mismatch,
                adjusted_bound_bps: observation.adjusted_bound_bps,
            });
        }

        let outcome = self.damper.damp(
            raw_price,
            reference.price,
            bound.bound_bps,
            reference.manipulation_probability,
        )?;
        events.push(SettlementEvent::ValidationResult {
            pool: pool.id,
            spot_price: raw_price,
            reference_price: reference.price,
            passed: !outcome.damped,
        });
        if outcome.alert {
            warn!(
                pool = %pool.id,
                raw = %raw_price,
                reference = %reference.price,
                probability = %reference.manipulation_probability,
                "manipulation probability above alert threshold"
            );
            events.push(SettlementEvent::ManipulationAlert {
                pool: pool.id,
                spot_price: raw_price,
                reference_price: reference.price,
            });
        }

        let effective_fee_bps = self.fees.effective_fee(
            pool.fee_bps,
            reference.regime,
            reference.manipulation_probability,
            bound.stealth,
        );
        events.push(SettlementEvent::FeeSurcharge {
            pool: pool.id,
            base_fee_bps: pool.fee_bps,
            effective_fee_bps,
        });

        debug!(
            pool = %pool.id,
            regime = ?reference.regime,
            bound_bps = bound.bound_bps,
            stealth = bound.stealth,
            damped = outcome.damped,
            effective_fee_bps,
            "price validated"
        );

        Ok(PriceDecision {
            clearing_price: outcome.final_price,
            raw_price: Some(raw_price),
            effective_fee_bps,
            validated: true,
            damped: outcome.damped,
        })
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Run a validated config mutation as the admin and record it
    fn administer<F>(&self, caller: &Address, mutate: F) -> ClearingResult<()>
    where
        F: FnOnce(&mut SettlementConfig) -> ClearingResult<ConfigChange>,
    {
        let change = {
            let mut config = self.config.write();
            if !config.is_admin(caller) {
                return Err(ClearingError::Unauthorized);
            }
            mutate(&mut config)?
        };
        info!(?change, "settlement config changed");
        self.sink.record(SettlementEvent::ConfigChanged(change));
        Ok(())
    }

    pub fn set_reference_source(
        &self,
        caller: &Address,
        source: Option<Arc<dyn ReferencePriceSource>>,
    ) -> ClearingResult<()> {
        self.administer(caller, |config| Ok(config.set_reference_source(source)))
    }

    pub fn set_volatility_source(
        &self,
        caller: &Address,
        source: Option<Arc<dyn VolatilitySource>>,
    ) -> ClearingResult<()> {
        self.administer(caller, |config| Ok(config.set_volatility_source(source)))
    }

    pub fn set_validation_enabled(&self, caller: &Address, enabled: bool) -> ClearingResult<()> {
        self.administer(caller, |config| Ok(config.set_validation_enabled(enabled)))
    }

    pub fn set_max_staleness_secs(&self, caller: &Address, secs: u64) -> ClearingResult<()> {
        self.administer(caller, |config| config.set_max_staleness_secs(secs))
    }

    pub fn set_base_deviation_bps(&self, caller: &Address, bps: u32) -> ClearingResult<()> {
        self.administer(caller, |config| config.set_base_deviation_bps(bps))
    }

    pub fn set_protocol_fee_share_bps(&self, caller: &Address, bps: u32) -> ClearingResult<()> {
        self.administer(caller, |config| config.set_protocol_fee_share_bps(bps))
    }

    pub fn add_executor(&self, caller: &Address, executor: Address) -> ClearingResult<()> {
        self.administer(caller, |config| config.add_executor(executor))
    }

    pub fn remove_executor(&self, caller: &Address, executor: &Address) -> ClearingResult<()> {
        self.administer(caller, |config| Ok(config.remove_executor(executor)))
    }
}
