//! # Settlement Telemetry
//!
//! Ordered audit records emitted by the settlement pipeline and the admin
//! surface. Records go to a [`TelemetrySink`]; logging is separate.

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::math::Wad;
use crate::types::{Address, PoolId, Regime, VolatilityTier};

/// Administrative change
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigChange {
    /// Reference-price source set (`true`) or unset
    ReferenceSource(bool),
    VolatilitySource(bool),
    ValidationEnabled(bool),
    MaxStalenessSecs(u64),
    BaseDeviationBoundBps(u32),
    ProtocolFeeShareBps(u32),
    ExecutorAdded(Address),
    ExecutorRemoved(Address),
}

/// Audit record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum SettlementEvent {
    /// Raw price checked against the reference
    ValidationResult {
        pool: PoolId,
        spot_price: Wad,
        reference_price: Wad,
        passed: bool,
    },
    ManipulationAlert {
        pool: PoolId,
        spot_price: Wad,
        reference_price: Wad,
    },
    FeeSurcharge {
        pool: PoolId,
        base_fee_bps: u32,
        effective_fee_bps: u32,
    },
    VolatilityCrossValidation {
        pool: PoolId,
        regime: Regime,
        tier: VolatilityTier,
        mismatch: bool,
        adjusted_bound_bps: u32,
    },
    ConfigChanged(ConfigChange),
    BatchSettled {
        pool: PoolId,
        batch_id: u64,
        clearing_price: Wad,
        effective_fee_bps: u32,
    },
}

/// Receiver of audit records
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: SettlementEvent);
}

/// Forwards records to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: SettlementEvent) {
        match event {
            SettlementEvent::ValidationResult {
                pool,
                spot_price,
                reference_price,
                passed,
            } => info!(
                target: "batchclear::telemetry",
                %pool, %spot_price, %reference_price, passed,
                "validation result"
            ),
            SettlementEvent::ManipulationAlert {
                pool,
                spot_price,
                reference_price,
            } => warn!(
                target: "batchclear::telemetry",
                %pool, %spot_price, %reference_price,
                "manipulation alert"
            ),
            SettlementEvent::FeeSurcharge {
                pool,
                base_fee_bps,
                effective_fee_bps,
            } => info!(
                target: "batchclear::telemetry",
                %pool, base_fee_bps, effective_fee_bps,
                "fee surcharge"
            ),
            SettlementEvent::VolatilityCrossValidation {
                pool,
                regime,
                tier,
                mismatch,
                adjusted_bound_bps,
            } => info!(
                target: "batchclear::telemetry",
                %pool, ?regime, ?tier, mismatch, adjusted_bound_bps,
                "volatility cross-validation"
            ),
            SettlementEvent::ConfigChanged(change) => info!(
                target: "batchclear::telemetry",
                ?change,
                "config changed"
            ),
            SettlementEvent::BatchSettled {
                pool,
                batch_id,
                clearing_price,
                effective_fee_bps,
            } => info!(
                target: "batchclear::telemetry",
                %pool, batch_id, %clearing_price, effective_fee_bps,
                "batch settled"
            ),
        }
    }
}

/// Keeps records in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SettlementEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SettlementEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<SettlementEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: SettlementEvent) {
        self.events.lock().push(event);
    }
}
