/// Content-addressed pipeline cache
///
/// Two-level memoization:
/// 1. Pipeline layouts keyed by {shader stages, push constant size, ordered
///    set-layout handles}. Pipelines that share a layout shape share one
///    layout object.
/// 2. Pipelines keyed by the layout key combined with every other field of
///    the definition (and the target formats for graphics pipelines).
///
/// A hit returns the cached pair with no device call. Keys are 64-bit
/// content hashes; a collision would return a wrong pipeline and is not
/// guarded against. Entries are never evicted.

use std::hash::{Hash, Hasher};
use rustc_hash::{FxHashMap, FxHasher};

use crate::{engine_debug, engine_error, engine_trace};
use crate::error::Result;
use crate::device::{
    ComputePipelineDesc, DescriptorSetLayoutHandle, GraphicsPipelineDesc, PipelineBindPoint,
    PipelineLayoutDesc, PipelineLayoutHandle, PushConstantRange, ShaderStageFlags, SharedDevice,
};
use crate::pipeline::definition::{
    ComputePipelineDefinition, GraphicsPipelineDefinition, PipelineBinding, TargetInfo,
};
use crate::utils::lock;

/// Counters reported by `PipelineCache::stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Distinct pipelines created
    pub pipelines: usize,
    /// Distinct pipeline layouts created
    pub layouts: usize,
}

pub struct PipelineCache {
    device: SharedDevice,
    layouts: FxHashMap<u64, PipelineLayoutHandle>,
    pipelines: FxHashMap<u64, PipelineBinding>,
    hits: u64,
    misses: u64,
}

impl PipelineCache {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            layouts: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the graphics pipeline for `definition` rendering into `target`
    ///
    /// # Errors
    ///
    /// Device creation failures are returned as-is; nothing is cached and
    /// nothing is retried.
    pub fn fetch_graphics_pipeline(
        &mut self,
        definition: &GraphicsPipelineDefinition,
        target: &TargetInfo,
    ) -> Result<PipelineBinding> {
        let layout_key = layout_hash(
            definition.shader_stages(),
            definition.push_constant_size,
            &definition.descriptor_set_layouts,
        );
        let key = graphics_hash(layout_key, definition, target);

        if let Some(binding) = self.pipelines.get(&key) {
            self.hits += 1;
            engine_trace!("strata::PipelineCache", "Graphics pipeline hit {:#018x}", key);
            return Ok(*binding);
        }
        self.misses += 1;

        let layout = self.fetch_layout(
            layout_key,
            &definition.descriptor_set_layouts,
            &definition.push_constant_ranges(),
        )?;

        let desc = GraphicsPipelineDesc { layout, definition, target };
        let pipeline = lock(&self.device, "device")?
            .create_graphics_pipeline(&desc)
            .map_err(|e| {
                engine_error!("strata::PipelineCache", "Failed to create graphics pipeline {:#018x}: {}", key, e);
                e
            })?;

        let binding = PipelineBinding {
            pipeline,
            layout,
            bind_point: PipelineBindPoint::Graphics,
        };
        self.pipelines.insert(key, binding);
        engine_debug!(
            "strata::PipelineCache",
            "Created graphics pipeline {:#018x} ({} colour target(s))",
            key, target.color_formats.len()
        );
        Ok(binding)
    }

    /// Return the compute pipeline for `definition`
    pub fn fetch_compute_pipeline(&mut self, definition: &ComputePipelineDefinition) -> Result<PipelineBinding> {
        let layout_key = layout_hash(
            definition.shader_stages(),
            definition.push_constant_size,
            &definition.descriptor_set_layouts,
        );
        let key = compute_hash(layout_key, definition);

        if let Some(binding) = self.pipelines.get(&key) {
            self.hits += 1;
            engine_trace!("strata::PipelineCache", "Compute pipeline hit {:#018x}", key);
            return Ok(*binding);
        }
        self.misses += 1;

        let layout = self.fetch_layout(
            layout_key,
            &definition.descriptor_set_layouts,
            &definition.push_constant_ranges(),
        )?;

        let desc = ComputePipelineDesc { layout, definition };
        let pipeline = lock(&self.device, "device")?
            .create_compute_pipeline(&desc)
            .map_err(|e| {
                engine_error!("strata::PipelineCache", "Failed to create compute pipeline {:#018x}: {}", key, e);
                e
            })?;

        let binding = PipelineBinding {
            pipeline,
            layout,
            bind_point: PipelineBindPoint::Compute,
        };
        self.pipelines.insert(key, binding);
        engine_debug!(
            "strata::PipelineCache",
            "Created compute pipeline {:#018x} ({})",
            key, definition.shader.entry_point
        );
        Ok(binding)
    }

    pub fn stats(&self) -> PipelineCacheStats {
        PipelineCacheStats {
            hits: self.hits,
            misses: self.misses,
            pipelines: self.pipelines.len(),
            layouts: self.layouts.len(),
        }
    }

    /// Destroy every cached pipeline, then every cached layout
    pub fn destroy_all(&mut self) {
        if self.pipelines.is_empty() && self.layouts.is_empty() {
            return;
        }
        if let Ok(mut device) = self.device.lock() {
            for (_, binding) in self.pipelines.drain() {
                device.destroy_pipeline(binding.pipeline);
            }
            for (_, layout) in self.layouts.drain() {
                device.destroy_pipeline_layout(layout);
            }
        }
    }

    fn fetch_layout(
        &mut self,
        key: u64,
        set_layouts: &[DescriptorSetLayoutHandle],
        push_constant_ranges: &[PushConstantRange],
    ) -> Result<PipelineLayoutHandle> {
        if let Some(layout) = self.layouts.get(&key) {
            return Ok(*layout);
        }

        let desc = PipelineLayoutDesc { set_layouts, push_constant_ranges };
        let layout = lock(&self.device, "device")?
            .create_pipeline_layout(&desc)
            .map_err(|e| {
                engine_error!("strata::PipelineCache", "Failed to create pipeline layout {:#018x}: {}", key, e);
                e
            })?;
        self.layouts.insert(key, layout);
        Ok(layout)
    }
}

impl Drop for PipelineCache {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

// ===== CACHE KEYS =====

/// Key of the pipeline layout shape
///
/// Set layouts are compared by handle; the layout cache guarantees equal
/// binding lists share a handle.
pub(crate) fn layout_hash(
    stages: ShaderStageFlags,
    push_constant_size: u32,
    set_layouts: &[DescriptorSetLayoutHandle],
) -> u64 {
    let mut hasher = FxHasher::default();
    stages.hash(&mut hasher);
    push_constant_size.hash(&mut hasher);
    set_layouts.len().hash(&mut hasher);
    for layout in set_layouts {
        layout.hash(&mut hasher);
    }
    hasher.finish()
}

pub(crate) fn graphics_hash(
    layout_key: u64,
    definition: &GraphicsPipelineDefinition,
    target: &TargetInfo,
) -> u64 {
    let mut hasher = FxHasher::default();
    PipelineBindPoint::Graphics.hash(&mut hasher);
    layout_key.hash(&mut hasher);
    definition.vertex_shader.hash(&mut hasher);
    definition.fragment_shader.hash(&mut hasher);
    definition.vertex_layout.hash(&mut hasher);
    definition.topology.hash(&mut hasher);
    definition.rasterization.hash(&mut hasher);
    definition.depth_stencil.hash(&mut hasher);
    definition.color_blend.hash(&mut hasher);
    definition.multisample.hash(&mut hasher);
    target.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn compute_hash(layout_key: u64, definition: &ComputePipelineDefinition) -> u64 {
    let mut hasher = FxHasher::default();
    PipelineBindPoint::Compute.hash(&mut hasher);
    layout_key.hash(&mut hasher);
    definition.shader.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "pipeline_cache_tests.rs"]
mod tests;
