/// Fixed-capacity descriptor pool
///
/// Sized once from per-type ratios and never grows. Meant for small,
/// precisely sized, long-lived sets (the bindless set, global samplers).
/// Sets are only released in bulk through `clear()`.

use crate::{engine_debug, engine_error};
use crate::error::{Error, Result};
use crate::device::{
    DescriptorPoolDesc, DescriptorPoolFlags, DescriptorPoolHandle, DescriptorPoolSize,
    DescriptorSetHandle, DescriptorSetLayoutHandle, SharedDevice,
};
use crate::descriptor::pool_sizes::{pool_sizes, PoolSizeRatio};
use crate::utils::lock;

pub struct StaticDescriptorPool {
    device: SharedDevice,
    pool: DescriptorPoolHandle,
    max_sets: u32,
    sizes: Vec<DescriptorPoolSize>,
}

impl StaticDescriptorPool {
    /// Create the device pool
    ///
    /// # Arguments
    ///
    /// * `device` - Device that owns the pool
    /// * `max_sets` - Maximum number of sets allocated between two `clear()`
    /// * `flags` - Pool creation flags (e.g. `UPDATE_AFTER_BIND` for bindless)
    /// * `ratios` - Descriptors of each type to reserve per set
    pub fn new(
        device: SharedDevice,
        max_sets: u32,
        flags: DescriptorPoolFlags,
        ratios: &[PoolSizeRatio],
    ) -> Result<Self> {
        let sizes = pool_sizes(ratios, max_sets);
        Self::with_sizes(device, max_sets, flags, sizes)
    }

    /// Create the device pool from exact per-type counts
    pub fn with_sizes(
        device: SharedDevice,
        max_sets: u32,
        flags: DescriptorPoolFlags,
        sizes: Vec<DescriptorPoolSize>,
    ) -> Result<Self> {
        let desc = DescriptorPoolDesc { max_sets, flags, sizes };
        let pool = lock(&device, "device")?
            .create_descriptor_pool(&desc)
            .map_err(|e| {
                engine_error!("strata::StaticDescriptorPool", "Failed to create pool of {} sets: {}", max_sets, e);
                e
            })?;

        engine_debug!("strata::StaticDescriptorPool", "Created pool of {} sets", max_sets);

        Ok(Self {
            device,
            pool,
            max_sets,
            sizes: desc.sizes,
        })
    }

    /// Allocate one set per layout
    ///
    /// There is no growth and no retry: running out of room returns
    /// `Error::PoolExhausted`.
    pub fn allocate(&mut self, layouts: &[DescriptorSetLayoutHandle]) -> Result<Vec<DescriptorSetHandle>> {
        let result = lock(&self.device, "device")?.allocate_descriptor_sets(self.pool, layouts);
        match result {
            Ok(sets) => Ok(sets),
            Err(e) if e.is_pool_capacity() => {
                engine_error!(
                    "strata::StaticDescriptorPool",
                    "Pool of {} sets cannot hold {} more set(s): {}",
                    self.max_sets, layouts.len(), e
                );
                Err(Error::PoolExhausted(format!(
                    "static pool of {} sets: {}", self.max_sets, e
                )))
            }
            Err(e) => {
                engine_error!("strata::StaticDescriptorPool", "Set allocation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Release every set allocated from this pool
    ///
    /// The caller guarantees no in-flight GPU work still reads those sets.
    pub fn clear(&mut self) -> Result<()> {
        lock(&self.device, "device")?.reset_descriptor_pool(self.pool)
    }

    pub fn handle(&self) -> DescriptorPoolHandle {
        self.pool
    }

    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    /// Descriptors reserved per type
    pub fn capacity(&self) -> &[DescriptorPoolSize] {
        &self.sizes
    }
}

impl Drop for StaticDescriptorPool {
    fn drop(&mut self) {
        if let Ok(mut device) = self.device.lock() {
            device.destroy_descriptor_pool(self.pool);
        }
    }
}

#[cfg(test)]
#[path = "static_pool_tests.rs"]
mod tests;
