use std::collections::HashSet;
use std::fs;

use serde::{Deserialize, Serialize};

use batchclear_core::curve::{CONSTANT_PRODUCT_CURVE, STABLE_SWAP_CURVE};
use batchclear_core::{
    Address, CurveParams, Pool, PoolId, Regime, VolatilityTier, Wad, DEFAULT_AMPLIFICATION,
    DEFAULT_BASE_DEVIATION_BPS, DEFAULT_BASE_FEE_BPS, DEFAULT_MAX_STALENESS_SECS,
    DEFAULT_PROTOCOL_FEE_SHARE_BPS, MAX_BPS, MAX_EFFECTIVE_FEE_BPS, MAX_MAX_STALENESS_SECS,
    MAX_PROTOCOL_FEE_SHARE_BPS, MIN_MAX_STALENESS_SECS, WAD,
};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Principal allowed to change settlement parameters
    pub admin: Address,

    /// Principal the keeper settles batches as
    pub executor: Address,

    /// Settlement parameters
    pub settlement: SettlementSection,

    /// Reference price served to the validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceConfig>,

    /// Volatility classification served to the validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<VolatilityConfig>,

    /// Pools to register at startup
    pub pools: Vec<PoolConfig>,

    /// Opening trader balances
    #[serde(default)]
    pub traders: Vec<TraderBalance>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettlementSection {
    pub validation_enabled: bool,

    /// Maximum reference/volatility age in seconds
    pub max_staleness_secs: u64,

    /// Deviation bound before regime adjustments (basis points)
    pub base_deviation_bps: u32,

    /// Share of collected fees routed to the treasury (basis points)
    pub protocol_fee_share_bps: u32,
}

/// Static reference quote, restamped on every query
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceConfig {
    /// Token1 per token0, as a decimal string
    #[serde(with = "wad_serde")]
    pub price: Wad,

    pub regime: Regime,

    #[serde(default, with = "wad_serde")]
    pub manipulation_probability: Wad,

    #[serde(default)]
    pub usdt_dominant: bool,

    #[serde(default)]
    pub usdc_dominant: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VolatilityConfig {
    pub tier: VolatilityTier,

    #[serde(default, with = "wad_serde")]
    pub realized_volatility: Wad,
}

/// Configuration for an individual pool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Pool name for logging
    pub name: String,

    pub id: PoolId,
    pub token0: Address,
    pub token1: Address,

    /// Opening reserves in 18-decimal token units
    #[serde(with = "amount_serde")]
    pub reserve0: u128,
    #[serde(with = "amount_serde")]
    pub reserve1: u128,

    /// Base fee (basis points)
    pub fee_bps: u32,

    /// Curve identifier
    pub curve: String,

    #[serde(default = "default_amplification")]
    pub amplification: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraderBalance {
    pub trader: Address,
    pub token: Address,
    #[serde(with = "amount_serde")]
    pub amount: u128,
}

fn default_amplification() -> u64 {
    DEFAULT_AMPLIFICATION
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::IoError(format!("Failed to read config file {}: {}", path, e)))?;

        let config: KeeperConfig = toml::from_str(&content).map_err(|e| {
            KeeperError::SerializationError(format!("Failed to parse config file {}: {}", path, e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KeeperError::SerializationError(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| KeeperError::IoError(format!("Failed to write config file {}: {}", path, e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        if self.admin.is_zero() {
            return Err(KeeperError::invalid_parameter("admin", "zero", "non-zero address"));
        }

        if self.executor.is_zero() {
            return Err(KeeperError::invalid_parameter("executor", "zero", "non-zero address"));
        }

        if self.pools.is_empty() {
            return Err(KeeperError::invalid_parameter("pools", "empty", "at least one pool"));
        }

        let mut ids = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            if !ids.insert(pool.id) {
                return Err(KeeperError::invalid_parameter("pool id", &pool.id.to_string(), "unique id"));
            }
        }

        self.settlement.validate()?;

        if let Some(reference) = &self.reference {
            reference.validate()?;
        }

        for balance in &self.traders {
            if balance.trader.is_zero() || balance.token.is_zero() {
                return Err(KeeperError::invalid_parameter("trader balance", "zero", "non-zero addresses"));
            }
        }

        Ok(())
    }

    /// Look up a pool by name
    pub fn pool_named(&self, name: &str) -> Option<&PoolConfig> {
        self.pools.iter().find(|pool| pool.name == name)
    }
}

impl SettlementSection {
    fn validate(&self) -> KeeperResult<()> {
        if !(MIN_MAX_STALENESS_SECS..=MAX_MAX_STALENESS_SECS).contains(&self.max_staleness_secs) {
            return Err(KeeperError::invalid_parameter(
                "max_staleness_secs",
                &self.max_staleness_secs.to_string(),
                &format!("between {} and {}", MIN_MAX_STALENESS_SECS, MAX_MAX_STALENESS_SECS),
            ));
        }

        if self.base_deviation_bps > MAX_BPS {
            return Err(KeeperError::invalid_parameter(
                "base_deviation_bps",
                &self.base_deviation_bps.to_string(),
                "at most 10000 (100%)",
            ));
        }

        if self.protocol_fee_share_bps > MAX_PROTOCOL_FEE_SHARE_BPS {
            return Err(KeeperError::invalid_parameter(
                "protocol_fee_share_bps",
                &self.protocol_fee_share_bps.to_string(),
                &format!("at most {}", MAX_PROTOCOL_FEE_SHARE_BPS),
            ));
        }

        Ok(())
    }
}

impl ReferenceConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.price.is_zero() {
            return Err(KeeperError::invalid_parameter("reference.price", "0", "greater than 0"));
        }

        if self.manipulation_probability > Wad::ONE {
            return Err(KeeperError::invalid_parameter(
                "reference.manipulation_probability",
                &wad_serde::format(self.manipulation_probability.raw()),
                "at most 1.0",
            ));
        }

        Ok(())
    }
}

impl PoolConfig {
    /// Validate pool configuration
    fn validate(&self) -> KeeperResult<()> {
        if self.name.is_empty() {
            return Err(KeeperError::invalid_parameter("pool name", "empty", "non-empty string"));
        }

        if self.curve != CONSTANT_PRODUCT_CURVE && self.curve != STABLE_SWAP_CURVE {
            return Err(KeeperError::invalid_parameter(
                "curve",
                &self.curve,
                &format!("{} or {}", CONSTANT_PRODUCT_CURVE, STABLE_SWAP_CURVE),
            ));
        }

        if self.fee_bps > MAX_EFFECTIVE_FEE_BPS {
            return Err(KeeperError::invalid_parameter(
                "fee_bps",
                &self.fee_bps.to_string(),
                &format!("at most {}", MAX_EFFECTIVE_FEE_BPS),
            ));
        }

        if self.reserve0 == 0 || self.reserve1 == 0 {
            return Err(KeeperError::invalid_parameter(&self.name, "zero reserve", "positive reserves"));
        }

        Ok(())
    }

    /// Build the initialized pool this entry describes
    pub fn to_pool(&self) -> KeeperResult<Pool> {
        let curve = CurveParams::new(self.curve.clone()).with_amplification(self.amplification);
        Ok(Pool::new(
            self.id,
            self.token0,
            self.token1,
            self.reserve0,
            self.reserve1,
            self.fee_bps,
            curve,
        )?)
    }
}

impl Default for SettlementSection {
    fn default() -> Self {
        Self {
            validation_enabled: true,
            max_staleness_secs: DEFAULT_MAX_STALENESS_SECS,
            base_deviation_bps: DEFAULT_BASE_DEVIATION_BPS,
            protocol_fee_share_bps: DEFAULT_PROTOCOL_FEE_SHARE_BPS,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "Default Pool".to_string(),
            id: PoolId::repeat(0x10),
            token0: Address::repeat(0x01),
            token1: Address::repeat(0x02),
            reserve0: 1_000_000 * WAD,
            reserve1: 1_000_000 * WAD,
            fee_bps: DEFAULT_BASE_FEE_BPS,
            curve: CONSTANT_PRODUCT_CURVE.to_string(),
            amplification: DEFAULT_AMPLIFICATION,
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            admin: Address::repeat(0xAA),
            executor: Address::repeat(0xBB),
            settlement: SettlementSection::default(),
            reference: None,
            volatility: None,
            pools: vec![],
            traders: vec![],
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let weth = Address::repeat(0x01);
    let usdc = Address::repeat(0x02);
    let usdt = Address::repeat(0x03);
    let trader = Address::repeat(0x0A);

    let example_config = KeeperConfig {
        reference: Some(ReferenceConfig {
            price: Wad(2_000 * WAD),
            regime: Regime::Normal,
            manipulation_probability: Wad::ZERO,
            usdt_dominant: false,
            usdc_dominant: false,
        }),
        volatility: Some(VolatilityConfig {
            tier: VolatilityTier::Medium,
            realized_volatility: Wad(WAD / 2),
        }),
        pools: vec![
            PoolConfig {
                name: "WETH/USDC".to_string(),
                id: PoolId::repeat(0x10),
                token0: weth,
                token1: usdc,
                reserve0: 1_000 * WAD,
                reserve1: 2_000_000 * WAD,
                fee_bps: 30,
                curve: CONSTANT_PRODUCT_CURVE.to_string(),
                amplification: DEFAULT_AMPLIFICATION,
            },
            PoolConfig {
                name: "USDC/USDT".to_string(),
                id: PoolId::repeat(0x11),
                token0: usdc,
                token1: usdt,
                reserve0: 5_000_000 * WAD,
                reserve1: 5_000_000 * WAD,
                fee_bps: 5,
                curve: STABLE_SWAP_CURVE.to_string(),
                amplification: 200,
            },
        ],
        traders: vec![
            TraderBalance { trader, token: weth, amount: 100 * WAD },
            TraderBalance { trader, token: usdc, amount: 200_000 * WAD },
        ],
        ..KeeperConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}

/// Fixed-point decimals as strings; TOML integers stop at i64
pub(crate) mod wad_serde {
    use batchclear_core::{Wad, WAD};
    use serde::{Deserialize, Deserializer, Serializer};

    const DECIMALS: usize = 18;

    /// Parse `"123.456"` into an 18-decimal raw value
    pub fn parse(s: &str) -> Result<u128, String> {
        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err("empty decimal".to_string());
        }
        if fraction.len() > DECIMALS {
            return Err(format!("{}: more than {} decimal places", s, DECIMALS));
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(format!("{}: not a decimal number", s));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|e| format!("{}: {}", s, e))?
        };
        let fraction: u128 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = DECIMALS);
            padded.parse().map_err(|e| format!("{}: {}", s, e))?
        };

        whole
            .checked_mul(WAD)
            .and_then(|scaled| scaled.checked_add(fraction))
            .ok_or_else(|| format!("{}: out of range", s))
    }

    pub fn format(raw: u128) -> String {
        let whole = raw / WAD;
        let fraction = raw % WAD;
        if fraction == 0 {
            return whole.to_string();
        }
        let digits = format!("{:0>width$}", fraction, width = DECIMALS);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }

    pub fn serialize<S>(value: &Wad, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value.raw()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Wad, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map(Wad).map_err(serde::de::Error::custom)
    }
}

/// Token amounts share the decimal rendering of prices
mod amount_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::wad_serde;

    pub fn serialize<S>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&wad_serde::format(*amount))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        wad_serde::parse(&s).map_err(serde::de::Error::custom)
    }
}
