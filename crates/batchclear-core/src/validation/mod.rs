//! # Price Validation
//!
//! Deviation bound composition, golden-ratio damping of out-of-bound prices,
//! and the risk-scaled fee surcharge.

pub mod damper;
pub mod deviation;
pub mod fee;

pub use damper::{DampingOutcome, PriceDamper};
pub use deviation::{CrossValidation, DeviationBound, DeviationBoundCalculator, VolatilitySignal};
pub use fee::FeeSurchargeCalculator;
