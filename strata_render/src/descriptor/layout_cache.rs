/// Content-addressed descriptor set layout cache
///
/// Field-equal requests always return the same layout handle, so callers can
/// compare layout handles to test set-shape equivalence. The pipeline cache
/// relies on this when it keys pipeline layouts by set-layout identity.
/// Entries live until `destroy_all()` or drop.

use std::hash::{Hash, Hasher};
use rustc_hash::{FxHashMap, FxHasher};

use crate::{engine_debug, engine_error, engine_trace};
use crate::error::Result;
use crate::device::{
    DescriptorBinding, DescriptorSetLayoutDesc, DescriptorSetLayoutFlags,
    DescriptorSetLayoutHandle, ShaderStageFlags, SharedDevice,
};
use crate::utils::lock;

pub struct DescriptorLayoutCache {
    device: SharedDevice,
    layouts: FxHashMap<u64, DescriptorSetLayoutHandle>,
}

impl DescriptorLayoutCache {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            layouts: FxHashMap::default(),
        }
    }

    /// Return the layout for this binding list, creating it on first request
    ///
    /// # Arguments
    ///
    /// * `stages` - Shader stages every binding is visible to
    /// * `bindings` - Binding slots (index, type, count, per-binding flags)
    /// * `flags` - Layout creation flags
    pub fn fetch_layout(
        &mut self,
        stages: ShaderStageFlags,
        bindings: &[DescriptorBinding],
        flags: DescriptorSetLayoutFlags,
    ) -> Result<DescriptorSetLayoutHandle> {
        let key = layout_hash(stages, bindings, flags);
        if let Some(layout) = self.layouts.get(&key) {
            engine_trace!("strata::DescriptorLayoutCache", "Layout hit {:#018x}", key);
            return Ok(*layout);
        }

        let desc = DescriptorSetLayoutDesc { stages, bindings, flags };
        let layout = lock(&self.device, "device")?
            .create_descriptor_set_layout(&desc)
            .map_err(|e| {
                engine_error!(
                    "strata::DescriptorLayoutCache",
                    "Failed to create layout with {} binding(s): {}",
                    bindings.len(), e
                );
                e
            })?;

        engine_debug!(
            "strata::DescriptorLayoutCache",
            "Created layout {:#018x} ({} binding(s))",
            key, bindings.len()
        );
        self.layouts.insert(key, layout);
        Ok(layout)
    }

    /// Number of distinct layouts created
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Destroy every cached layout
    ///
    /// Pipelines and sets built from these layouts must be gone already.
    pub fn destroy_all(&mut self) {
        if self.layouts.is_empty() {
            return;
        }
        if let Ok(mut device) = self.device.lock() {
            for (_, layout) in self.layouts.drain() {
                device.destroy_descriptor_set_layout(layout);
            }
        }
    }
}

impl Drop for DescriptorLayoutCache {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

/// Cache key for a layout request
///
/// Binding order is part of the key.
pub(crate) fn layout_hash(
    stages: ShaderStageFlags,
    bindings: &[DescriptorBinding],
    flags: DescriptorSetLayoutFlags,
) -> u64 {
    let mut hasher = FxHasher::default();
    stages.hash(&mut hasher);
    flags.hash(&mut hasher);
    bindings.len().hash(&mut hasher);
    for binding in bindings {
        binding.binding.hash(&mut hasher);
        binding.descriptor_type.hash(&mut hasher);
        binding.count.hash(&mut hasher);
        binding.flags.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
#[path = "layout_cache_tests.rs"]
mod tests;
