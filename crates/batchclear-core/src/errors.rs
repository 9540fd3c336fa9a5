//! # Core Error Types
//!
//! Errors that abort an operation. Collaborator unavailability is not an
//! error here: gateways degrade it to `GatewayOutcome::Unavailable`.

use thiserror::Error;

use crate::types::PoolId;

/// Errors raised by clearing, validation and settlement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize))]
pub enum ClearingError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Mul div overflow")]
    MulDivOverflow,

    #[error("Solver did not converge")]
    NoConvergence,

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Staleness threshold {0}s outside [{1}s, {2}s]")]
    InvalidStaleness(u64, u64, u64),

    #[error("Protocol fee share {0} bps exceeds {1} bps")]
    InvalidFeeShare(u32, u32),

    #[error("Deviation bound {0} bps exceeds 10000")]
    InvalidDeviationBound(u32),

    #[error("Zero address")]
    ZeroAddress,

    #[error("Invalid pool: {0}")]
    InvalidPool(&'static str),

    #[error("Pool {0} already exists")]
    PoolExists(PoolId),

    #[error("Curve already registered: {0}")]
    CurveExists(String),

    // ========================================================================
    // Settlement Invariant Errors
    // ========================================================================

    #[error("Pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("Pool not initialized")]
    NotInitialized,

    #[error("Pool {0} is already settling")]
    PoolBusy(PoolId),

    #[error("Batch {batch_id} is not newer than last settled batch {last}")]
    StaleBatch { batch_id: u64, last: u64 },

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Invalid order {index}: {reason}")]
    InvalidOrder { index: usize, reason: &'static str },

    #[error("Unknown curve: {0}")]
    UnknownCurve(String),

    #[error("Slippage exceeded for order {index}: out {amount_out} < min {min_amount_out}")]
    SlippageExceeded {
        index: usize,
        amount_out: u128,
        min_amount_out: u128,
    },

    #[error("Settlement would deplete pool reserves")]
    ReserveDepleted,

    #[error("Invalid clearing price")]
    InvalidPrice,

    #[error("Output inconsistent with clearing price")]
    OutputMismatch,

    #[error("Protocol fee exceeds collected fee")]
    ProtocolFeeExceedsFee,

    #[error("Token transfer rejected: {0}")]
    TransferFailed(String),

    // ========================================================================
    // Access Control Errors
    // ========================================================================

    #[error("Unauthorized")]
    Unauthorized,
}

/// Result type using clearing errors
pub type ClearingResult<T> = Result<T, ClearingError>;

impl ClearingError {
    /// Create an invalid order error
    pub fn invalid_order(index: usize, reason: &'static str) -> Self {
        Self::InvalidOrder { index, reason }
    }

    /// Whether the error reports a rejected administrative configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidStaleness(..)
                | Self::InvalidFeeShare(..)
                | Self::InvalidDeviationBound(_)
                | Self::ZeroAddress
                | Self::InvalidPool(_)
                | Self::PoolExists(_)
                | Self::CurveExists(_)
        )
    }
}
