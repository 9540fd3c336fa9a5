//! # Curve Pricing
//!
//! Pluggable exchange functions and the pricing engine that turns a batch's
//! aggregated order flow into a raw execution price.

pub mod constant_product;
pub mod pricing;
pub mod stable_swap;

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ClearingError, ClearingResult};
use crate::types::CurveParams;

pub use constant_product::ConstantProductCurve;
pub use pricing::{aggregate_flow, CurvePricingEngine, OrderFlow, RawPrice};
pub use stable_swap::StableSwapCurve;

/// Identifier of the constant-product curve
pub const CONSTANT_PRODUCT_CURVE: &str = "constant-product";

/// Identifier of the two-coin stable-swap curve
pub const STABLE_SWAP_CURVE: &str = "stable-swap";

/// Exchange function of a pool curve
pub trait CurveStrategy: Send + Sync {
    /// Output for `amount_in` against the given reserves.
    ///
    /// Fee is deducted from the input before the exchange function applies.
    fn get_amount_out(
        &self,
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
        params: &CurveParams,
    ) -> ClearingResult<u128>;
}

/// Curve strategies keyed by identifier
#[derive(Clone)]
pub struct CurveRegistry {
    curves: HashMap<String, Arc<dyn CurveStrategy>>,
}

impl CurveRegistry {
    /// Registry without any curves
    pub fn empty() -> Self {
        Self {
            curves: HashMap::new(),
        }
    }

    /// Register a strategy under a new identifier
    pub fn register(
        &mut self,
        curve_id: impl Into<String>,
        strategy: Arc<dyn CurveStrategy>,
    ) -> ClearingResult<()> {
        let curve_id = curve_id.into();
        if self.curves.contains_key(&curve_id) {
            return Err(ClearingError::CurveExists(curve_id));
        }
        self.curves.insert(curve_id, strategy);
        Ok(())
    }

    pub fn get(&self, curve_id: &str) -> ClearingResult<&Arc<dyn CurveStrategy>> {
        self.curves
            .get(curve_id)
            .ok_or_else(|| ClearingError::UnknownCurve(curve_id.to_string()))
    }

    pub fn contains(&self, curve_id: &str) -> bool {
        self.curves.contains_key(curve_id)
    }
}

impl Default for CurveRegistry {
    /// Constant-product and stable-swap curves
    fn default() -> Self {
        let mut curves: HashMap<String, Arc<dyn CurveStrategy>> = HashMap::new();
        curves.insert(CONSTANT_PRODUCT_CURVE.to_string(), Arc::new(ConstantProductCurve));
        curves.insert(STABLE_SWAP_CURVE.to_string(), Arc::new(StableSwapCurve));
        Self { curves }
    }
}

impl std::fmt::Debug for CurveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.curves.keys().collect();
        ids.sort();
        f.debug_struct("CurveRegistry").field("curves", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = CurveRegistry::default();
        assert!(registry.contains(CONSTANT_PRODUCT_CURVE));
        assert!(registry.contains(STABLE_SWAP_CURVE));
        assert_eq!(
            registry.get("weighted").err(),
            Some(ClearingError::UnknownCurve("weighted".to_string()))
        );
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = CurveRegistry::default();
        let result = registry.register(CONSTANT_PRODUCT_CURVE, Arc::new(ConstantProductCurve));
        assert_eq!(
            result,
            Err(ClearingError::CurveExists(CONSTANT_PRODUCT_CURVE.to_string()))
        );

        let mut empty = CurveRegistry::empty();
        empty.register("custom", Arc::new(ConstantProductCurve)).unwrap();
        assert!(empty.contains("custom"));
    }
}
