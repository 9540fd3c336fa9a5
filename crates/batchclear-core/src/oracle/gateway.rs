//! The three collaborator gateways.

use std::sync::Arc;

use tracing::warn;

use super::{
    is_fresh, GatewayOutcome, ReferencePriceSource, UnavailableReason, VolatilitySource,
};
use crate::types::{PoolId, ReferencePriceData, StablecoinContext, VolatilityData};

/// Fresh reference prices, or nothing
#[derive(Clone)]
pub struct ReferencePriceGateway {
    source: Option<Arc<dyn ReferencePriceSource>>,
    max_staleness_secs: u64,
}

impl ReferencePriceGateway {
    pub fn new(source: Option<Arc<dyn ReferencePriceSource>>, max_staleness_secs: u64) -> Self {
        Self {
            source,
            max_staleness_secs,
        }
    }

    pub fn query(&self, pool: &PoolId, now: u64) -> GatewayOutcome<ReferencePriceData> {
        let Some(source) = &self.source else {
            return GatewayOutcome::Unavailable(UnavailableReason::Unset);
        };

        let data = match source.get_price(pool) {
            Ok(data) => data,
            Err(err) => {
                warn!(pool = %pool, error = %err, "reference price query failed");
                return GatewayOutcome::Unavailable(UnavailableReason::CallFailed);
            }
        };

        if data.price.is_zero() {
            warn!(pool = %pool, "reference price source has no data");
            return GatewayOutcome::Unavailable(UnavailableReason::NoData);
        }
        if !is_fresh(data.timestamp, now, self.max_staleness_secs) {
            warn!(
                pool = %pool,
                timestamp = data.timestamp,
                now,
                max_age = self.max_staleness_secs,
                "reference price is stale"
            );
            return GatewayOutcome::Unavailable(UnavailableReason::Stale);
        }

        GatewayOutcome::Available(data)
    }
}

/// Stablecoin dominance context from the reference source
#[derive(Clone)]
pub struct StablecoinContextGateway {
    source: Option<Arc<dyn ReferencePriceSource>>,
}

impl StablecoinContextGateway {
    pub fn new(source: Option<Arc<dyn ReferencePriceSource>>) -> Self {
        Self { source }
    }

    /// The context carries no timestamp; a zero ratio is its "no data" marker
    pub fn query(&self) -> GatewayOutcome<StablecoinContext> {
        let Some(source) = &self.source else {
            return GatewayOutcome::Unavailable(UnavailableReason::Unset);
        };

        match source.get_stablecoin_context() {
            Ok(context) if context.ratio.is_zero() => {
                GatewayOutcome::Unavailable(UnavailableReason::NoData)
            }
            Ok(context) => GatewayOutcome::Available(context),
            Err(err) => {
                warn!(error = %err, "stablecoin context query failed");
                GatewayOutcome::Unavailable(UnavailableReason::CallFailed)
            }
        }
    }
}

/// Fresh realized volatility, or nothing
#[derive(Clone)]
pub struct VolatilityGateway {
    source: Option<Arc<dyn VolatilitySource>>,
    max_staleness_secs: u64,
}

impl VolatilityGateway {
    pub fn new(source: Option<Arc<dyn VolatilitySource>>, max_staleness_secs: u64) -> Self {
        Self {
            source,
            max_staleness_secs,
        }
    }

    pub fn query(&self, pool: &PoolId, now: u64) -> GatewayOutcome<VolatilityData> {
        let Some(source) = &self.source else {
            return GatewayOutcome::Unavailable(UnavailableReason::Unset);
        };

        match source.get_volatility_data(pool) {
            Ok(data) if !is_fresh(data.timestamp, now, self.max_staleness_secs) => {
                warn!(pool = %pool, timestamp = data.timestamp, now, "volatility data is stale");
                GatewayOutcome::Unavailable(UnavailableReason::Stale)
            }
            Ok(data) => GatewayOutcome::Available(data),
            Err(err) => {
                warn!(pool = %pool, error = %err, "volatility query failed");
                GatewayOutcome::Unavailable(UnavailableReason::CallFailed)
            }
        }
    }
}
