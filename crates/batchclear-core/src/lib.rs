//! # Batch Clearing Core
//!
//! Derives the uniform clearing price of a batch of pooled swap orders and
//! enforces price integrity against an external reference price:
//!
//! - Fixed-point (1e18) math with 256-bit intermediates
//! - Pluggable curve strategies for raw price discovery
//! - Fault-tolerant gateways to reference-price and volatility collaborators
//! - Regime-aware deviation bounds, golden-ratio damping and fee surcharges
//! - Atomic, reentrancy-guarded batch settlement over a keyed pool store
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization for off-chain tooling

pub mod constants;
pub mod curve;
pub mod errors;
pub mod math;
pub mod oracle;
pub mod settlement;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use constants::*;
pub use curve::{CurveRegistry, CurveStrategy};
pub use errors::{ClearingError, ClearingResult};
pub use math::{Rounding, Wad};
pub use oracle::{Clock, GatewayOutcome, ReferencePriceSource, SourceError, SystemClock, VolatilitySource};
pub use settlement::{Account, BatchSettlementEngine, InMemoryLedger, SettlementConfig, TokenLedger, Transfer};
pub use store::PoolStore;
pub use telemetry::{ConfigChange, MemorySink, SettlementEvent, TelemetrySink, TracingSink};
pub use types::*;
