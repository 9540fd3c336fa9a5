//! Configured collaborators for offline settlement.
//!
//! Quotes come from the keeper config and are stamped with the current clock
//! reading, so they are always fresh.

use std::sync::Arc;

use batchclear_core::{
    Clock, PoolId, ReferencePriceData, ReferencePriceSource, SourceError, StablecoinContext,
    VolatilityData, VolatilitySource,
};

use crate::config::{ReferenceConfig, VolatilityConfig};

pub struct ConfiguredReferenceSource {
    quote: ReferenceConfig,
    clock: Arc<dyn Clock>,
}

impl ConfiguredReferenceSource {
    pub fn new(quote: ReferenceConfig, clock: Arc<dyn Clock>) -> Self {
        Self { quote, clock }
    }
}

impl ReferencePriceSource for ConfiguredReferenceSource {
    fn get_price(&self, _pool: &PoolId) -> Result<ReferencePriceData, SourceError> {
        Ok(ReferencePriceData::new(self.quote.price, self.quote.regime, self.clock.now())
            .with_manipulation_probability(self.quote.manipulation_probability))
    }

    fn get_stablecoin_context(&self) -> Result<StablecoinContext, SourceError> {
        Ok(StablecoinContext {
            usdt_dominant: self.quote.usdt_dominant,
            usdc_dominant: self.quote.usdc_dominant,
            ..StablecoinContext::neutral()
        })
    }
}

pub struct ConfiguredVolatilitySource {
    config: VolatilityConfig,
    clock: Arc<dyn Clock>,
}

impl ConfiguredVolatilitySource {
    pub fn new(config: VolatilityConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }
}

impl VolatilitySource for ConfiguredVolatilitySource {
    fn get_volatility_data(&self, _pool: &PoolId) -> Result<VolatilityData, SourceError> {
        Ok(VolatilityData {
            realized_volatility: self.config.realized_volatility,
            ..VolatilityData::new(self.config.tier, self.clock.now())
        })
    }
}
