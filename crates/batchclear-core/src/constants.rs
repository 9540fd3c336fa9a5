//! # Protocol Constants
//!
//! Fundamental constants for batch clearing including:
//! - Fixed-point scale and basis-point denominators
//! - Regime, stablecoin and volatility bound factors
//! - Fee surcharge shares and the absolute fee cap
//! - Staleness and protocol-fee configuration bounds

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Fixed-point scale factor: 1e18
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Golden ratio in 1e18 fixed point (1.618033988749894848)
pub const PHI_WAD: u128 = 1_618_033_988_749_894_848;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Maximum percentage in basis points (100%)
pub const MAX_BPS: u32 = 10_000;

// ============================================================================
// Deviation Bound Constants
// ============================================================================

/// Default base deviation bound (5%)
pub const DEFAULT_BASE_DEVIATION_BPS: u32 = 500;

/// Regime factors, as fractions of 10,000
pub const REGIME_FACTOR_NORMAL: u32 = 10_000;
pub const REGIME_FACTOR_CASCADE: u32 = 6_000;
pub const REGIME_FACTOR_MANIPULATION: u32 = 7_000;
pub const REGIME_FACTOR_HIGH_LEVERAGE: u32 = 8_500;
pub const REGIME_FACTOR_TREND: u32 = 13_000;
pub const REGIME_FACTOR_LOW_VOLATILITY: u32 = 7_000;

/// Stablecoin dominance factors
pub const USDT_DOMINANT_FACTOR: u32 = 8_000;
pub const USDC_DOMINANT_FACTOR: u32 = 12_000;

/// Danger regime with low measured volatility (tighten 30%)
pub const STEALTH_MANIPULATION_FACTOR: u32 = 7_000;

/// Danger regime corroborated by high volatility (tighten 15%)
pub const CONFIRMED_DANGER_FACTOR: u32 = 8_500;

/// Benign regime with extreme volatility (widen 15%)
pub const ORGANIC_VOLATILITY_FACTOR: u32 = 11_500;

// ============================================================================
// Fee Structure Constants
// ============================================================================

/// Absolute cap on the effective fee (5%)
pub const MAX_EFFECTIVE_FEE_BPS: u32 = 500;

/// Default pool fee rate (0.3%)
pub const DEFAULT_BASE_FEE_BPS: u32 = 30;

/// Regime surcharges, as shares of the base fee (10,000 = 100%)
pub const MANIPULATION_SURCHARGE_SHARE: u32 = 10_000;
pub const CASCADE_SURCHARGE_SHARE: u32 = 20_000;
pub const HIGH_LEVERAGE_SURCHARGE_SHARE: u32 = 5_000;

/// Manipulation probability surcharges
pub const HIGH_MANIPULATION_SURCHARGE_SHARE: u32 = 20_000;
pub const ELEVATED_MANIPULATION_SURCHARGE_SHARE: u32 = 10_000;

/// Stealth flag surcharge
pub const STEALTH_SURCHARGE_SHARE: u32 = 5_000;

/// Default protocol fee share (10%)
pub const DEFAULT_PROTOCOL_FEE_SHARE_BPS: u32 = 1_000;

/// Maximum protocol fee share (25%)
pub const MAX_PROTOCOL_FEE_SHARE_BPS: u32 = 2_500;

// ============================================================================
// Probability Thresholds (1e18 fixed point)
// ============================================================================

/// Above this probability a manipulation alert is raised (70%)
pub const MANIPULATION_ALERT_THRESHOLD: u128 = 700_000_000_000_000_000;

/// Above this probability the high surcharge applies (80%)
pub const HIGH_MANIPULATION_THRESHOLD: u128 = 800_000_000_000_000_000;

/// Above this probability the elevated surcharge applies (50%)
pub const ELEVATED_MANIPULATION_THRESHOLD: u128 = 500_000_000_000_000_000;

// ============================================================================
// Oracle Constants
// ============================================================================

/// Minimum configurable staleness threshold (30 seconds)
pub const MIN_MAX_STALENESS_SECS: u64 = 30;

/// Maximum configurable staleness threshold (30 minutes)
pub const MAX_MAX_STALENESS_SECS: u64 = 1_800;

/// Default staleness threshold (5 minutes)
pub const DEFAULT_MAX_STALENESS_SECS: u64 = 300;

// ============================================================================
// Curve Constants
// ============================================================================

/// Maximum Newton iterations for stable-swap solvers
pub const STABLE_SWAP_MAX_ITERATIONS: usize = 255;

/// Default stable-swap amplification coefficient
pub const DEFAULT_AMPLIFICATION: u64 = 100;
