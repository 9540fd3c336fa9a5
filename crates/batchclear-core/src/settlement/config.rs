//! Administrative configuration of the settlement engine.
//!
//! Every setter validates before mutating and returns the [`ConfigChange`]
//! to record; a rejected value leaves the configuration untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::constants::*;
use crate::errors::{ClearingError, ClearingResult};
use crate::oracle::{ReferencePriceSource, VolatilitySource};
use crate::telemetry::ConfigChange;
use crate::types::Address;

#[derive(Clone)]
pub struct SettlementConfig {
    admin: Address,
    executors: BTreeSet<Address>,
    reference_source: Option<Arc<dyn ReferencePriceSource>>,
    volatility_source: Option<Arc<dyn VolatilitySource>>,
    validation_enabled: bool,
    max_staleness_secs: u64,
    base_deviation_bps: u32,
    protocol_fee_share_bps: u32,
}

impl SettlementConfig {
    /// Defaults with no sources and no executors
    pub fn new(admin: Address) -> ClearingResult<Self> {
        if admin.is_zero() {
            return Err(ClearingError::ZeroAddress);
        }
        Ok(Self {
            admin,
            executors: BTreeSet::new(),
            reference_source: None,
            volatility_source: None,
            validation_enabled: true,
            max_staleness_secs: DEFAULT_MAX_STALENESS_SECS,
            base_deviation_bps: DEFAULT_BASE_DEVIATION_BPS,
            protocol_fee_share_bps: DEFAULT_PROTOCOL_FEE_SHARE_BPS,
        })
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        !caller.is_zero() && *caller == self.admin
    }

    pub fn is_executor(&self, caller: &Address) -> bool {
        self.executors.contains(caller)
    }

    pub fn executors(&self) -> impl Iterator<Item = &Address> {
        self.executors.iter()
    }

    pub fn reference_source(&self) -> Option<Arc<dyn ReferencePriceSource>> {
        self.reference_source.clone()
    }

    pub fn volatility_source(&self) -> Option<Arc<dyn VolatilitySource>> {
        self.volatility_source.clone()
    }

    pub fn validation_enabled(&self) -> bool {
        self.validation_enabled
    }

    pub fn max_staleness_secs(&self) -> u64 {
        self.max_staleness_secs
    }

    pub fn base_deviation_bps(&self) -> u32 {
        self.base_deviation_bps
    }

    pub fn protocol_fee_share_bps(&self) -> u32 {
        self.protocol_fee_share_bps
    }

    pub fn set_reference_source(
        &mut self,
        source: Option<Arc<dyn ReferencePriceSource>>,
    ) -> ConfigChange {
        let change = ConfigChange::ReferenceSource(source.is_some());
        self.reference_source = source;
        change
    }

    pub fn set_volatility_source(&mut self, source: Option<Arc<dyn VolatilitySource>>) -> ConfigChange {
        let change = ConfigChange::VolatilitySource(source.is_some());
        self.volatility_source = source;
        change
    }

    pub fn set_validation_enabled(&mut self, enabled: bool) -> ConfigChange {
        self.validation_enabled = enabled;
        ConfigChange::ValidationEnabled(enabled)
    }

    pub fn set_max_staleness_secs(&mut self, secs: u64) -> ClearingResult<ConfigChange> {
        if !(MIN_MAX_STALENESS_SECS..=MAX_MAX_STALENESS_SECS).contains(&secs) {
            return Err(ClearingError::InvalidStaleness(
                secs,
                MIN_MAX_STALENESS_SECS,
                MAX_MAX_STALENESS_SECS,
            ));
        }
        self.max_staleness_secs = secs;
        Ok(ConfigChange::MaxStalenessSecs(secs))
    }

    pub fn set_base_deviation_bps(&mut self, bps: u32) -> ClearingResult<ConfigChange> {
        if bps > MAX_BPS {
            return Err(ClearingError::InvalidDeviationBound(bps));
        }
        self.base_deviation_bps = bps;
        Ok(ConfigChange::BaseDeviationBoundBps(bps))
    }

    pub fn set_protocol_fee_share_bps(&mut self, bps: u32) -> ClearingResult<ConfigChange> {
        if bps > MAX_PROTOCOL_FEE_SHARE_BPS {
            return Err(ClearingError::InvalidFeeShare(bps, MAX_PROTOCOL_FEE_SHARE_BPS));
        }
        self.protocol_fee_share_bps = bps;
        Ok(ConfigChange::ProtocolFeeShareBps(bps))
    }

    pub fn add_executor(&mut self, executor: Address) -> ClearingResult<ConfigChange> {
        if executor.is_zero() {
            return Err(ClearingError::ZeroAddress);
        }
        self.executors.insert(executor);
        Ok(ConfigChange::ExecutorAdded(executor))
    }

    /// Removing an unknown executor is a no-op that is still recorded
    pub fn remove_executor(&mut self, executor: &Address) -> ConfigChange {
        self.executors.remove(executor);
        ConfigChange::ExecutorRemoved(*executor)
    }
}

impl fmt::Debug for SettlementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementConfig")
            .field("admin", &self.admin)
            .field("executors", &self.executors)
            .field("reference_source", &self.reference_source.is_some())
            .field("volatility_source", &self.volatility_source.is_some())
            .field("validation_enabled", &self.validation_enabled)
            .field("max_staleness_secs", &self.max_staleness_secs)
            .field("base_deviation_bps", &self.base_deviation_bps)
            .field("protocol_fee_share_bps", &self.protocol_fee_share_bps)
            .finish()
    }
}
