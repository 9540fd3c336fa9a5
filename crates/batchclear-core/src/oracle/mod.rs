//! # Oracle Gateways
//!
//! Query-only access to the external reference-price and volatility sources.
//! A gateway never fails: every problem with its collaborator (unset, failed
//! call, sentinel value, stale timestamp) becomes
//! [`GatewayOutcome::Unavailable`] and the caller skips the adjustment.

pub mod clock;
pub mod gateway;

use thiserror::Error;

use crate::types::{PoolId, ReferencePriceData, StablecoinContext, VolatilityData};

pub use clock::{Clock, FixedClock, SystemClock};
pub use gateway::{ReferencePriceGateway, StablecoinContextGateway, VolatilityGateway};

/// Failure reported by an external source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source call failed: {0}")]
    CallFailed(String),
}

/// External reference ("true") price source
pub trait ReferencePriceSource: Send + Sync {
    fn get_price(&self, pool: &PoolId) -> Result<ReferencePriceData, SourceError>;

    fn get_stablecoin_context(&self) -> Result<StablecoinContext, SourceError>;
}

/// External realized-volatility source
pub trait VolatilitySource: Send + Sync {
    fn get_volatility_data(&self, pool: &PoolId) -> Result<VolatilityData, SourceError>;
}

/// Why a gateway had nothing to offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No source configured
    Unset,
    /// The source call returned an error
    CallFailed,
    /// The source answered with its "no data" sentinel
    NoData,
    /// The data is older than the configured maximum age
    Stale,
}

/// Result of a gateway query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome<T> {
    Available(T),
    Unavailable(UnavailableReason),
}

impl<T> GatewayOutcome<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, GatewayOutcome::Available(_))
    }

    pub fn available(self) -> Option<T> {
        match self {
            GatewayOutcome::Available(value) => Some(value),
            GatewayOutcome::Unavailable(_) => None,
        }
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            GatewayOutcome::Available(value) => Some(value),
            GatewayOutcome::Unavailable(_) => None,
        }
    }
}

/// Data stamped `timestamp` is fresh at `now` iff it is non-zero and at most
/// `max_age_secs` old.
pub fn is_fresh(timestamp: u64, now: u64, max_age_secs: u64) -> bool {
    timestamp != 0 && now <= timestamp.saturating_add(max_age_secs)
}
