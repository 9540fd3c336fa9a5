//! # Batch Settlement
//!
//! Admin configuration, the token ledger seam, staged settlement plans and
//! the engine that drives a batch from aggregation to commit.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod plan;

pub use config::SettlementConfig;
pub use engine::BatchSettlementEngine;
pub use ledger::{Account, InMemoryLedger, LedgerError, TokenLedger, Transfer};
pub use plan::{PriceDecision, SettlementPlan};
