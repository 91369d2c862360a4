/// Growable pool-of-pools for transient descriptor sets
///
/// Keeps two lists of device pools. **free** pools may still have room;
/// **used** pools reported exhaustion. An allocation pops a free pool (or
/// creates one at the current `sets_per_pool`, which then doubles up to a
/// cap), and on a capacity error parks that pool in **used** and retries once
/// against another. The pool that satisfied an allocation goes straight back
/// to **free**: exhaustion is discovered lazily by the next failing call, no
/// capacity is tracked here.
///
/// `clear()` resets every pool. Call it only once the fence of every frame
/// that bound sets from this pool has signalled.

use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use crate::error::{Error, Result};
use crate::device::{
    DescriptorPoolDesc, DescriptorPoolFlags, DescriptorPoolHandle, DescriptorSetHandle,
    DescriptorSetLayoutHandle, SharedDevice,
};
use crate::descriptor::pool_sizes::{pool_sizes, PoolSizeRatio};
use crate::utils::lock;

/// Sets per pool for the first pool created
pub const DEFAULT_INITIAL_SETS_PER_POOL: u32 = 1000;

/// `sets_per_pool` never grows past this
pub const DEFAULT_MAX_SETS_PER_POOL: u32 = 4092;

pub struct DynamicDescriptorPool {
    device: SharedDevice,
    ratios: Vec<PoolSizeRatio>,
    flags: DescriptorPoolFlags,
    free_pools: Vec<DescriptorPoolHandle>,
    used_pools: Vec<DescriptorPoolHandle>,
    sets_per_pool: u32,
    max_sets_per_pool: u32,
}

impl DynamicDescriptorPool {
    /// Create an empty allocator; device pools are created on demand
    ///
    /// # Arguments
    ///
    /// * `device` - Device that owns the pools
    /// * `ratios` - Descriptors of each type to reserve per set
    /// * `initial_sets_per_pool` - Size of the first pool
    /// * `max_sets_per_pool` - Cap on pool growth
    pub fn new(
        device: SharedDevice,
        ratios: Vec<PoolSizeRatio>,
        initial_sets_per_pool: u32,
        max_sets_per_pool: u32,
    ) -> Self {
        Self {
            device,
            ratios,
            flags: DescriptorPoolFlags::empty(),
            free_pools: Vec::new(),
            used_pools: Vec::new(),
            sets_per_pool: initial_sets_per_pool.clamp(1, max_sets_per_pool.max(1)),
            max_sets_per_pool: max_sets_per_pool.max(1),
        }
    }

    /// Allocate one set per layout, retrying once on a fresh pool
    ///
    /// # Errors
    ///
    /// `Error::PoolExhausted` when the retry pool fails too. Non-capacity
    /// device errors are returned unchanged, without retry.
    pub fn allocate(&mut self, layouts: &[DescriptorSetLayoutHandle]) -> Result<Vec<DescriptorSetHandle>> {
        let pool = self.grab_pool()?;

        let first = self.allocate_from(pool, layouts);
        let error = match first {
            Ok(sets) => {
                self.free_pools.push(pool);
                return Ok(sets);
            }
            Err(e) if e.is_pool_capacity() => e,
            Err(e) => {
                self.free_pools.push(pool);
                engine_error!("strata::DynamicDescriptorPool", "Set allocation failed: {}", e);
                return Err(e);
            }
        };

        engine_trace!(
            "strata::DynamicDescriptorPool",
            "Pool {} reported {}, retrying on a fresh pool",
            pool.as_raw(), error
        );
        self.used_pools.push(pool);

        let retry = self.grab_pool()?;
        match self.allocate_from(retry, layouts) {
            Ok(sets) => {
                self.free_pools.push(retry);
                Ok(sets)
            }
            Err(e) if e.is_pool_capacity() => {
                self.used_pools.push(retry);
                engine_error!(
                    "strata::DynamicDescriptorPool",
                    "Allocation of {} set(s) failed after retry: {}",
                    layouts.len(), e
                );
                Err(Error::PoolExhausted(format!(
                    "{} set(s) did not fit a fresh pool: {}", layouts.len(), e
                )))
            }
            Err(e) => {
                self.free_pools.push(retry);
                engine_error!("strata::DynamicDescriptorPool", "Set allocation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Reset every pool and mark them all free
    pub fn clear(&mut self) -> Result<()> {
        let mut device = lock(&self.device, "device")?;
        for pool in self.free_pools.iter().chain(self.used_pools.iter()) {
            device.reset_descriptor_pool(*pool)?;
        }
        drop(device);

        self.free_pools.append(&mut self.used_pools);
        Ok(())
    }

    /// Pools that may still have room
    pub fn free_pool_count(&self) -> usize {
        self.free_pools.len()
    }

    /// Pools that reported exhaustion since the last `clear()`
    pub fn used_pool_count(&self) -> usize {
        self.used_pools.len()
    }

    /// Size of the next pool this allocator creates
    pub fn sets_per_pool(&self) -> u32 {
        self.sets_per_pool
    }

    fn grab_pool(&mut self) -> Result<DescriptorPoolHandle> {
        if let Some(pool) = self.free_pools.pop() {
            return Ok(pool);
        }

        let max_sets = self.sets_per_pool;
        let desc = DescriptorPoolDesc {
            max_sets,
            flags: self.flags,
            sizes: pool_sizes(&self.ratios, max_sets),
        };
        let pool = lock(&self.device, "device")?
            .create_descriptor_pool(&desc)
            .map_err(|e| {
                engine_error!("strata::DynamicDescriptorPool", "Failed to create pool of {} sets: {}", max_sets, e);
                e
            })?;

        self.sets_per_pool = max_sets.saturating_mul(2).min(self.max_sets_per_pool);
        if self.sets_per_pool == self.max_sets_per_pool && max_sets < self.max_sets_per_pool {
            engine_warn!(
                "strata::DynamicDescriptorPool",
                "Pool growth reached its cap of {} sets",
                self.max_sets_per_pool
            );
        }
        engine_debug!("strata::DynamicDescriptorPool", "Created pool of {} sets", max_sets);
        Ok(pool)
    }

    fn allocate_from(
        &self,
        pool: DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        lock(&self.device, "device")?.allocate_descriptor_sets(pool, layouts)
    }
}

impl Drop for DynamicDescriptorPool {
    fn drop(&mut self) {
        if let Ok(mut device) = self.device.lock() {
            for pool in self.free_pools.drain(..).chain(self.used_pools.drain(..)) {
                device.destroy_descriptor_pool(pool);
            }
        }
    }
}

#[cfg(test)]
#[path = "dynamic_pool_tests.rs"]
mod tests;
