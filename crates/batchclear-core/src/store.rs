//! # Pool Store
//!
//! Keyed pool storage passed explicitly to the settlement engine. The map is
//! behind a read-write lock; each pool has its own mutex, which settlement
//! holds for the whole batch.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::constants::MAX_EFFECTIVE_FEE_BPS;
use crate::errors::{ClearingError, ClearingResult};
use crate::types::{Pool, PoolId};

#[derive(Debug, Default)]
pub struct PoolStore {
    pools: RwLock<HashMap<PoolId, Arc<Mutex<Pool>>>>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool under its own id
    pub fn insert(&self, pool: Pool) -> ClearingResult<()> {
        validate_pool(&pool)?;

        let mut pools = self.pools.write();
        if pools.contains_key(&pool.id) {
            return Err(ClearingError::PoolExists(pool.id));
        }
        pools.insert(pool.id, Arc::new(Mutex::new(pool)));
        Ok(())
    }

    /// Shared handle to a pool's lock
    pub fn handle(&self, id: &PoolId) -> ClearingResult<Arc<Mutex<Pool>>> {
        self.pools
            .read()
            .get(id)
            .cloned()
            .ok_or(ClearingError::PoolNotFound(*id))
    }

    /// Copy of the current pool state; waits for an in-flight settlement
    pub fn snapshot(&self, id: &PoolId) -> ClearingResult<Pool> {
        let handle = self.handle(id)?;
        let pool = handle.lock().clone();
        Ok(pool)
    }

    /// Copy of the current pool state, or `PoolBusy` while it is settling
    pub fn try_snapshot(&self, id: &PoolId) -> ClearingResult<Pool> {
        let handle = self.handle(id)?;
        let pool = handle.try_lock().ok_or(ClearingError::PoolBusy(*id))?.clone();
        Ok(pool)
    }

    /// Seed reserves of a registered, uninitialized pool
    pub fn initialize(&self, id: &PoolId, reserve0: u128, reserve1: u128) -> ClearingResult<()> {
        let handle = self.handle(id)?;
        let mut pool = handle.try_lock().ok_or(ClearingError::PoolBusy(*id))?;
        pool.initialize(reserve0, reserve1)
    }

    pub fn contains(&self, id: &PoolId) -> bool {
        self.pools.read().contains_key(id)
    }

    pub fn pool_ids(&self) -> Vec<PoolId> {
        let mut ids: Vec<_> = self.pools.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }
}

fn validate_pool(pool: &Pool) -> ClearingResult<()> {
    if pool.id.is_zero() || pool.token0.is_zero() || pool.token1.is_zero() {
        return Err(ClearingError::ZeroAddress);
    }
    if pool.token0 == pool.token1 {
        return Err(ClearingError::InvalidPool("identical tokens"));
    }
    if pool.fee_bps > MAX_EFFECTIVE_FEE_BPS {
        return Err(ClearingError::InvalidPool("fee above cap"));
    }
    if pool.initialized && (pool.reserve0 == 0 || pool.reserve1 == 0) {
        return Err(ClearingError::InvalidPool("zero reserves"));
    }
    Ok(())
}
