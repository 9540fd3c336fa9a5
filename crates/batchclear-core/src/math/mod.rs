//! # Mathematical Functions
//!
//! Checked 1e18 fixed-point arithmetic shared by pricing, validation and
//! settlement.

pub mod fixed_point;
pub mod safe_math;

// Re-export commonly used functions
pub use fixed_point::*;
pub use safe_math::*;
