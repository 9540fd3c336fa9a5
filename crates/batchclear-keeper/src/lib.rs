//! # Batch Clearing Keeper
//!
//! Operator tool that loads pools, balances and reference quotes from a TOML
//! config and settles JSON order batches through the clearing engine.

pub mod config;
pub mod error;
pub mod keeper;
pub mod sources;

pub use config::{create_example_config, KeeperConfig, PoolConfig, ReferenceConfig, VolatilityConfig};
pub use error::{KeeperError, KeeperResult};
pub use keeper::{BatchFile, Keeper};
