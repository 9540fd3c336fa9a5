//! # Core Type Definitions
//!
//! Pools, orders, collaborator snapshots and settlement results.

pub mod ids;
pub mod market;
pub mod orders;
pub mod pool;

// Re-export all types
pub use ids::*;
pub use market::*;
pub use orders::*;
pub use pool::*;
