/// Bindless resource registry
///
/// One descriptor set holds three arrays that shaders index directly:
///
/// - Binding 0: `SAMPLER[samplers]`
/// - Binding 1: `SAMPLED_IMAGE[textures_2d]`
/// - Binding 2: `SAMPLED_IMAGE[cubemaps]` (cube views)
///
/// Every binding is partially bound and update-after-bind: empty slots need
/// no write, and a slot can be written while frames that index other slots
/// are still in flight. Each category has its own free-list, so the three
/// categories write disjoint slots.
///
/// Registration is idempotent per resource. A handle carries the slot's
/// generation; unregistering bumps it, so a stale handle never compares equal
/// to the handle of whatever reuses the slot. Shaders only see the index:
/// callers must stop using a handle before its resource is destroyed.
///
/// Mutated from one thread only.

use rustc_hash::FxHashMap;

use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use crate::error::{Error, Result};
use crate::descriptor::{DescriptorLayoutCache, DescriptorWriter, StaticDescriptorPool};
use crate::device::{
    DescriptorBinding, DescriptorBindingFlags, DescriptorPoolFlags, DescriptorPoolSize,
    DescriptorSetHandle, DescriptorSetLayoutFlags, DescriptorSetLayoutHandle, DescriptorType,
    ImageLayout, ImageViewHandle, SamplerHandle, ShaderStageFlags, SharedDevice,
};
use crate::utils::{lock, Slot, SlotAllocator};

/// Which bindless array a resource lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindlessCategory {
    Sampler,
    Texture2D,
    Cubemap,
}

impl BindlessCategory {
    pub const ALL: [BindlessCategory; 3] = [
        BindlessCategory::Sampler,
        BindlessCategory::Texture2D,
        BindlessCategory::Cubemap,
    ];

    /// Binding index of this category's array
    pub fn binding(&self) -> u32 {
        match self {
            BindlessCategory::Sampler => 0,
            BindlessCategory::Texture2D => 1,
            BindlessCategory::Cubemap => 2,
        }
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            BindlessCategory::Sampler => DescriptorType::Sampler,
            BindlessCategory::Texture2D | BindlessCategory::Cubemap => DescriptorType::SampledImage,
        }
    }

    fn table(&self) -> usize {
        self.binding() as usize
    }
}

/// Array sizes of the bindless set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindlessCapacities {
    pub samplers: u32,
    pub textures_2d: u32,
    pub cubemaps: u32,
}

impl Default for BindlessCapacities {
    fn default() -> Self {
        Self {
            samplers: 64,
            textures_2d: 1024,
            cubemaps: 64,
        }
    }
}

impl BindlessCapacities {
    pub fn get(&self, category: BindlessCategory) -> u32 {
        match category {
            BindlessCategory::Sampler => self.samplers,
            BindlessCategory::Texture2D => self.textures_2d,
            BindlessCategory::Cubemap => self.cubemaps,
        }
    }
}

/// Stable index of a registered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindlessHandle {
    index: u32,
    generation: u32,
    category: BindlessCategory,
}

impl BindlessHandle {
    /// Array index shaders use
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn category(&self) -> BindlessCategory {
        self.category
    }

    fn slot(&self) -> Slot {
        Slot { index: self.index, generation: self.generation }
    }
}

/// Free-list and resource map of one category
struct CategoryTable {
    slots: SlotAllocator,
    by_resource: FxHashMap<u64, BindlessHandle>,
    /// Raw resource handle per live slot index
    resources: FxHashMap<u32, u64>,
}

impl CategoryTable {
    fn new(capacity: u32) -> Self {
        Self {
            slots: SlotAllocator::new(capacity),
            by_resource: FxHashMap::default(),
            resources: FxHashMap::default(),
        }
    }
}

pub struct BindlessRegistry {
    device: SharedDevice,
    layout: DescriptorSetLayoutHandle,
    set: DescriptorSetHandle,
    tables: [CategoryTable; 3],
    writer: DescriptorWriter,
    // Owns the set; dropped after everything above
    _pool: StaticDescriptorPool,
}

impl BindlessRegistry {
    /// Create the bindless layout, pool and set
    ///
    /// # Arguments
    ///
    /// * `device` - Device that owns the pool and set
    /// * `layout_cache` - Cache that owns the bindless layout
    /// * `capacities` - Array size of each category
    pub fn new(
        device: SharedDevice,
        layout_cache: &mut DescriptorLayoutCache,
        capacities: BindlessCapacities,
    ) -> Result<Self> {
        // 2D textures and cubemaps share the sampled-image pool size
        let sampled_images = capacities.textures_2d.checked_add(capacities.cubemaps).ok_or_else(|| {
            Error::InitializationFailed(format!(
                "bindless image capacity overflows: {} 2D textures + {} cubemaps",
                capacities.textures_2d, capacities.cubemaps
            ))
        })?;

        let flags = DescriptorBindingFlags::PARTIALLY_BOUND | DescriptorBindingFlags::UPDATE_AFTER_BIND;
        let bindings: Vec<DescriptorBinding> = BindlessCategory::ALL
            .iter()
            .map(|category| DescriptorBinding {
                binding: category.binding(),
                descriptor_type: category.descriptor_type(),
                count: capacities.get(*category),
                flags,
            })
            .collect();

        let layout = layout_cache.fetch_layout(
            ShaderStageFlags::ALL,
            &bindings,
            DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL,
        )?;

        let sizes: Vec<DescriptorPoolSize> = [
            (DescriptorType::Sampler, capacities.samplers),
            (DescriptorType::SampledImage, sampled_images),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(descriptor_type, count)| DescriptorPoolSize { descriptor_type, count })
        .collect();

        let mut pool = StaticDescriptorPool::with_sizes(
            device.clone(),
            1,
            DescriptorPoolFlags::UPDATE_AFTER_BIND,
            sizes,
        )?;
        let set = pool
            .allocate(&[layout])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InitializationFailed("bindless set allocation returned no set".to_string()))?;

        engine_debug!(
            "strata::BindlessRegistry",
            "Created bindless set ({} samplers, {} 2D textures, {} cubemaps)",
            capacities.samplers, capacities.textures_2d, capacities.cubemaps
        );

        Ok(Self {
            device,
            layout,
            set,
            tables: [
                CategoryTable::new(capacities.samplers),
                CategoryTable::new(capacities.textures_2d),
                CategoryTable::new(capacities.cubemaps),
            ],
            writer: DescriptorWriter::new(),
            _pool: pool,
        })
    }

    /// Register a sampler (idempotent)
    pub fn from_sampler(&mut self, sampler: SamplerHandle) -> Result<BindlessHandle> {
        if sampler.is_null() {
            return Err(Error::InvalidResource("null sampler".to_string()));
        }
        self.register(BindlessCategory::Sampler, sampler.as_raw())
    }

    /// Register a 2D texture view (idempotent)
    pub fn from_texture_2d(&mut self, view: ImageViewHandle) -> Result<BindlessHandle> {
        if view.is_null() {
            return Err(Error::InvalidResource("null 2D texture view".to_string()));
        }
        self.register(BindlessCategory::Texture2D, view.as_raw())
    }

    /// Register a cube view (idempotent)
    pub fn from_cubemap(&mut self, view: ImageViewHandle) -> Result<BindlessHandle> {
        if view.is_null() {
            return Err(Error::InvalidResource("null cubemap view".to_string()));
        }
        self.register(BindlessCategory::Cubemap, view.as_raw())
    }

    /// Release a handle's slot for reuse
    ///
    /// The slot keeps its old descriptor until it is reused. Returns false
    /// (and logs) when the handle is stale.
    pub fn unregister(&mut self, handle: BindlessHandle) -> bool {
        let table = &mut self.tables[handle.category.table()];
        if !table.slots.free(handle.slot()) {
            engine_warn!(
                "strata::BindlessRegistry",
                "Ignoring unregister of stale {:?} handle {} (generation {})",
                handle.category, handle.index, handle.generation
            );
            return false;
        }
        if let Some(resource) = table.resources.remove(&handle.index) {
            table.by_resource.remove(&resource);
        }
        engine_trace!(
            "strata::BindlessRegistry",
            "Released {:?} slot {}",
            handle.category, handle.index
        );
        true
    }

    /// Whether `handle` still refers to the resource it was issued for
    pub fn is_valid(&self, handle: BindlessHandle) -> bool {
        self.tables[handle.category.table()].slots.is_live(handle.slot())
    }

    /// The bindless descriptor set
    pub fn descriptor_set(&self) -> DescriptorSetHandle {
        self.set
    }

    /// Layout of the bindless set (owned by the layout cache)
    pub fn layout(&self) -> DescriptorSetLayoutHandle {
        self.layout
    }

    /// Registered resources in `category`
    pub fn len(&self, category: BindlessCategory) -> u32 {
        self.tables[category.table()].slots.len()
    }

    pub fn capacity(&self, category: BindlessCategory) -> u32 {
        self.tables[category.table()].slots.capacity()
    }

    fn register(&mut self, category: BindlessCategory, resource: u64) -> Result<BindlessHandle> {
        let table = &mut self.tables[category.table()];
        if let Some(handle) = table.by_resource.get(&resource) {
            return Ok(*handle);
        }

        let slot = table.slots.alloc().ok_or_else(|| {
            engine_error!(
                "strata::BindlessRegistry",
                "{:?} array is full ({} slots)",
                category, table.slots.capacity()
            );
            Error::PoolExhausted(format!("bindless {:?} array is full", category))
        })?;

        match category {
            BindlessCategory::Sampler => {
                self.writer.write_sampler(
                    self.set,
                    category.binding(),
                    slot.index,
                    SamplerHandle::from_raw(resource),
                );
            }
            BindlessCategory::Texture2D | BindlessCategory::Cubemap => {
                self.writer.write_image(
                    self.set,
                    category.binding(),
                    slot.index,
                    DescriptorType::SampledImage,
                    ImageViewHandle::from_raw(resource),
                    ImageLayout::ShaderReadOnly,
                );
            }
        }

        let flushed = match lock(&self.device, "device") {
            Ok(mut device) => self.writer.flush(&mut *device),
            Err(e) => Err(e),
        };
        if let Err(e) = flushed {
            self.writer.clear();
            self.tables[category.table()].slots.free(slot);
            engine_error!("strata::BindlessRegistry", "Failed to write {:?} slot {}: {}", category, slot.index, e);
            return Err(e);
        }

        let handle = BindlessHandle {
            index: slot.index,
            generation: slot.generation,
            category,
        };
        let table = &mut self.tables[category.table()];
        table.by_resource.insert(resource, handle);
        table.resources.insert(slot.index, resource);
        Ok(handle)
    }
}

#[cfg(test)]
#[path = "bindless_registry_tests.rs"]
mod tests;
